use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    access::GameScope,
    db_types::{Game, GameId, GameStatus, GameUpdate, NewGame, PlayerRange, TagId, UserId},
    query::GameQueryFilter,
    traits::GameApiError,
};

#[derive(Debug, Clone, FromRow)]
struct GameRow {
    id: GameId,
    title: String,
    min_players: Option<i64>,
    max_players: Option<i64>,
    status: GameStatus,
    submitted_by: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const GAME_COLUMNS: &str = "g.id, g.title, g.min_players, g.max_players, g.status, g.submitted_by, \
                            g.created_at, g.updated_at";

async fn tags_for_game(id: GameId, conn: &mut SqliteConnection) -> Result<Vec<TagId>, GameApiError> {
    sqlx::query_scalar::<_, TagId>("SELECT tag_id FROM game_tags WHERE game_id = ? ORDER BY tag_id")
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))
}

async fn shelves_for_game(id: GameId, conn: &mut SqliteConnection) -> Result<Vec<UserId>, GameApiError> {
    sqlx::query_scalar::<_, UserId>("SELECT user_id FROM game_shelves WHERE game_id = ? ORDER BY user_id")
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))
}

async fn assemble(row: GameRow, conn: &mut SqliteConnection) -> Result<Game, GameApiError> {
    let tags = tags_for_game(row.id, conn).await?;
    let shelves = shelves_for_game(row.id, conn).await?;
    Ok(Game {
        id: row.id,
        title: row.title,
        players: PlayerRange { min: row.min_players, max: row.max_players },
        status: row.status,
        tags,
        shelves,
        submitted_by: row.submitted_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub async fn insert_game(game: NewGame, conn: &mut SqliteConnection) -> Result<Game, GameApiError> {
    let now = Utc::now();
    let res = sqlx::query(
        "INSERT INTO games (title, min_players, max_players, status, submitted_by, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&game.title)
    .bind(game.players.min)
    .bind(game.players.max)
    .bind(GameStatus::Pending)
    .bind(game.submitted_by)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    let id = GameId(res.last_insert_rowid());
    replace_tags(id, &game.tags, conn).await?;
    fetch_game(id, GameScope::All, conn)
        .await?
        .ok_or_else(|| GameApiError::DatabaseError("Game vanished after insert".to_string()))
}

pub async fn fetch_game(
    id: GameId,
    scope: GameScope,
    conn: &mut SqliteConnection,
) -> Result<Option<Game>, GameApiError> {
    let mut q = format!("SELECT {GAME_COLUMNS} FROM games g WHERE g.id = ?");
    if scope == GameScope::ApprovedOnly {
        q.push_str(" AND g.status = 'approved'");
    }
    let row = sqlx::query_as::<_, GameRow>(&q)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    match row {
        Some(row) => Ok(Some(assemble(row, conn).await?)),
        None => Ok(None),
    }
}

/// Builds the catalog search. The scope clause is always present; client filters are ANDed
/// in only when supplied. Sorted ascending by title under the store's default collation.
pub async fn search_games(
    scope: GameScope,
    filter: GameQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Game>, GameApiError> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT DISTINCT {GAME_COLUMNS} FROM games g"));
    if filter.tag_id.is_some() {
        qb.push(" JOIN game_tags gt ON gt.game_id = g.id");
    }
    qb.push(" WHERE 1 = 1");
    if scope == GameScope::ApprovedOnly {
        qb.push(" AND g.status = 'approved'");
    }
    if let Some(term) = &filter.search_term {
        qb.push(" AND lower(g.title) LIKE ").push_bind(format!("%{}%", term.to_lowercase()));
    }
    if let Some(players) = filter.players {
        qb.push(" AND g.min_players <= ").push_bind(players);
        qb.push(" AND g.max_players >= ").push_bind(players);
    }
    if let Some(tag_id) = filter.tag_id {
        qb.push(" AND gt.tag_id = ").push_bind(tag_id);
    }
    qb.push(" ORDER BY g.title ASC");
    let rows = qb
        .build_query_as::<GameRow>()
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    let mut games = Vec::with_capacity(rows.len());
    for row in rows {
        games.push(assemble(row, conn).await?);
    }
    Ok(games)
}

pub async fn update_game(
    id: GameId,
    update: GameUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Game>, GameApiError> {
    let Some(existing) = fetch_game(id, GameScope::All, conn).await? else {
        return Ok(None);
    };
    let title = update.title.unwrap_or(existing.title);
    let min_players = update.min_players.or(existing.players.min);
    let max_players = update.max_players.or(existing.players.max);
    let status = update.status.unwrap_or(existing.status);
    sqlx::query(
        "UPDATE games SET title = ?, min_players = ?, max_players = ?, status = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&title)
    .bind(min_players)
    .bind(max_players)
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    if let Some(tags) = &update.tags {
        sqlx::query("DELETE FROM game_tags WHERE game_id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        replace_tags(id, tags, conn).await?;
    }
    fetch_game(id, GameScope::All, conn).await
}

pub async fn delete_game(id: GameId, conn: &mut SqliteConnection) -> Result<bool, GameApiError> {
    sqlx::query("DELETE FROM game_tags WHERE game_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    sqlx::query("DELETE FROM game_shelves WHERE game_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    let res = sqlx::query("DELETE FROM games WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    Ok(res.rows_affected() > 0)
}

pub async fn pull_game_from_shelves(id: GameId, conn: &mut SqliteConnection) -> Result<u64, GameApiError> {
    let res = sqlx::query("DELETE FROM user_games WHERE game_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    Ok(res.rows_affected())
}

pub async fn delete_games_submitted_by(user_id: UserId, conn: &mut SqliteConnection) -> Result<u64, GameApiError> {
    sqlx::query("DELETE FROM game_tags WHERE game_id IN (SELECT id FROM games WHERE submitted_by = ?)")
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    sqlx::query("DELETE FROM game_shelves WHERE game_id IN (SELECT id FROM games WHERE submitted_by = ?)")
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    let res = sqlx::query("DELETE FROM games WHERE submitted_by = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    Ok(res.rows_affected())
}

/// Replaces the reverse index with the current shelf membership. The two statements run on
/// one connection; readers in between see an empty or partial index, which the eventual
/// consistency contract allows.
pub async fn rebuild_shelves(conn: &mut SqliteConnection) -> Result<u64, GameApiError> {
    sqlx::query("DELETE FROM game_shelves")
        .execute(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    let res = sqlx::query(
        "INSERT INTO game_shelves (game_id, user_id) SELECT DISTINCT game_id, user_id FROM user_games",
    )
    .execute(&mut *conn)
    .await
    .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    Ok(res.rows_affected())
}

pub async fn count_games(conn: &mut SqliteConnection) -> Result<i64, GameApiError> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM games")
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| GameApiError::DatabaseError(e.to_string()))
}

async fn replace_tags(id: GameId, tags: &[TagId], conn: &mut SqliteConnection) -> Result<(), GameApiError> {
    for tag_id in tags {
        sqlx::query("INSERT INTO game_tags (game_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
    }
    Ok(())
}
