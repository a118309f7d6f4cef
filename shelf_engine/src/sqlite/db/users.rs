use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use super::is_unique_violation;
use crate::{
    db_types::{GameId, NewUser, User, UserId, UserUpdate},
    traits::UserApiError,
};

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    email: Option<String>,
    name: Option<String>,
    password_hash: String,
    admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, username, email, name, password_hash, admin, created_at, updated_at";

async fn shelf_for_user(id: UserId, conn: &mut SqliteConnection) -> Result<Vec<GameId>, UserApiError> {
    let games = sqlx::query_scalar::<_, GameId>("SELECT game_id FROM user_games WHERE user_id = ? ORDER BY id")
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
    Ok(games)
}

async fn assemble(row: UserRow, conn: &mut SqliteConnection) -> Result<User, UserApiError> {
    let games = shelf_for_user(row.id, conn).await?;
    Ok(User {
        id: row.id,
        username: row.username,
        email: row.email,
        name: row.name,
        password_hash: row.password_hash,
        admin: row.admin,
        games,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub async fn create_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, UserApiError> {
    let now = Utc::now();
    let res = sqlx::query(
        "INSERT INTO users (username, email, name, password_hash, admin, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.password_hash)
    .bind(user.admin)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e, "users.username") {
            UserApiError::UsernameTaken
        } else if is_unique_violation(&e, "users.email") {
            UserApiError::EmailTaken
        } else {
            UserApiError::DatabaseError(e.to_string())
        }
    })?;
    let id = UserId(res.last_insert_rowid());
    fetch_user(id, conn).await?.ok_or_else(|| UserApiError::DatabaseError("User vanished after insert".to_string()))
}

pub async fn fetch_user(id: UserId, conn: &mut SqliteConnection) -> Result<Option<User>, UserApiError> {
    let q = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let row = sqlx::query_as::<_, UserRow>(&q)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
    match row {
        Some(row) => Ok(Some(assemble(row, conn).await?)),
        None => Ok(None),
    }
}

pub async fn fetch_user_by_username(username: &str, conn: &mut SqliteConnection) -> Result<Option<User>, UserApiError> {
    let q = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
    let row = sqlx::query_as::<_, UserRow>(&q)
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
    match row {
        Some(row) => Ok(Some(assemble(row, conn).await?)),
        None => Ok(None),
    }
}

pub async fn fetch_all_users(conn: &mut SqliteConnection) -> Result<Vec<User>, UserApiError> {
    let q = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username ASC");
    let rows = sqlx::query_as::<_, UserRow>(&q)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
    let mut users = Vec::with_capacity(rows.len());
    for row in rows {
        users.push(assemble(row, conn).await?);
    }
    Ok(users)
}

/// Merges the update into the current record and writes it back in one statement. Returns
/// `None` when there is no such user.
pub async fn update_user(
    id: UserId,
    update: UserUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, UserApiError> {
    let Some(existing) = fetch_user(id, conn).await? else {
        return Ok(None);
    };
    let username = update.username.unwrap_or(existing.username);
    let email = update.email.or(existing.email);
    let name = update.name.or(existing.name);
    let password_hash = update.password_hash.unwrap_or(existing.password_hash);
    let admin = update.admin.unwrap_or(existing.admin);
    sqlx::query(
        "UPDATE users SET username = ?, email = ?, name = ?, password_hash = ?, admin = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&username)
    .bind(&email)
    .bind(&name)
    .bind(&password_hash)
    .bind(admin)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e, "users.username") {
            UserApiError::UsernameTaken
        } else if is_unique_violation(&e, "users.email") {
            UserApiError::EmailTaken
        } else {
            UserApiError::DatabaseError(e.to_string())
        }
    })?;
    fetch_user(id, conn).await
}

/// Removes the account and its shelf rows. Two statements on one connection; the shelf rows
/// go first so a failure cannot leave a user without a shelf record.
pub async fn delete_user(id: UserId, conn: &mut SqliteConnection) -> Result<bool, UserApiError> {
    sqlx::query("DELETE FROM user_games WHERE user_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
    let res = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
    Ok(res.rows_affected() > 0)
}

pub async fn add_game_to_shelf(
    user_id: UserId,
    game_id: GameId,
    conn: &mut SqliteConnection,
) -> Result<(), UserApiError> {
    sqlx::query("INSERT INTO user_games (user_id, game_id, added_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(game_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
    Ok(())
}

pub async fn remove_game_from_shelf(
    user_id: UserId,
    game_id: GameId,
    conn: &mut SqliteConnection,
) -> Result<u64, UserApiError> {
    let res = sqlx::query("DELETE FROM user_games WHERE user_id = ? AND game_id = ?")
        .bind(user_id)
        .bind(game_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
    Ok(res.rows_affected())
}
