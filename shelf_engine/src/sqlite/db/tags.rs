use chrono::Utc;
use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{NewTag, Tag, TagId, TagUpdate},
    traits::TagApiError,
};

const TAG_COLUMNS: &str = "id, name, category, created_at, updated_at";

pub async fn insert_tag(tag: NewTag, conn: &mut SqliteConnection) -> Result<Tag, TagApiError> {
    let now = Utc::now();
    let res = sqlx::query("INSERT INTO tags (name, category, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(&tag.name)
        .bind(tag.category)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "tags.name") {
                TagApiError::DuplicateTagName
            } else {
                TagApiError::DatabaseError(e.to_string())
            }
        })?;
    let id = TagId(res.last_insert_rowid());
    fetch_tag(id, conn).await?.ok_or_else(|| TagApiError::DatabaseError("Tag vanished after insert".to_string()))
}

pub async fn fetch_tag(id: TagId, conn: &mut SqliteConnection) -> Result<Option<Tag>, TagApiError> {
    let q = format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = ?");
    sqlx::query_as::<_, Tag>(&q)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| TagApiError::DatabaseError(e.to_string()))
}

pub async fn fetch_all_tags(conn: &mut SqliteConnection) -> Result<Vec<Tag>, TagApiError> {
    let q = format!("SELECT {TAG_COLUMNS} FROM tags ORDER BY name ASC");
    sqlx::query_as::<_, Tag>(&q)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| TagApiError::DatabaseError(e.to_string()))
}

pub async fn update_tag(
    id: TagId,
    update: TagUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Tag>, TagApiError> {
    let Some(existing) = fetch_tag(id, conn).await? else {
        return Ok(None);
    };
    let category = update.category.or(existing.category);
    sqlx::query("UPDATE tags SET name = ?, category = ?, updated_at = ? WHERE id = ?")
        .bind(&update.name)
        .bind(category)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "tags.name") {
                TagApiError::DuplicateTagName
            } else {
                TagApiError::DatabaseError(e.to_string())
            }
        })?;
    fetch_tag(id, conn).await
}

pub async fn delete_tag(id: TagId, conn: &mut SqliteConnection) -> Result<bool, TagApiError> {
    let res = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| TagApiError::DatabaseError(e.to_string()))?;
    Ok(res.rows_affected() > 0)
}

pub async fn detach_tag_from_games(id: TagId, conn: &mut SqliteConnection) -> Result<u64, TagApiError> {
    let res = sqlx::query("DELETE FROM game_tags WHERE tag_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| TagApiError::DatabaseError(e.to_string()))?;
    Ok(res.rows_affected())
}
