//! Low-level SQLite operations, grouped by resource.
//!
//! Clients should never call these functions directly; use the trait methods implemented on
//! [`super::SqliteDatabase`] instead.

pub mod games;
pub mod tags;
pub mod users;

use sqlx::{sqlite::SqlitePoolOptions, SqliteConnection, SqlitePool};

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// Creates the schema if it does not exist yet. Timestamps are bound from the application as
/// UTC datetimes, so the columns carry no SQL defaults.
pub async fn create_schema(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    const DDL: [&str; 6] = [
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT UNIQUE,
            name TEXT,
            password_hash TEXT NOT NULL,
            admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS games (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            min_players INTEGER,
            max_players INTEGER,
            status TEXT NOT NULL DEFAULT 'pending',
            submitted_by INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            category TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS game_tags (
            game_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL
        )",
        // The shelf. Rowid order is insertion order; duplicates are allowed.
        "CREATE TABLE IF NOT EXISTS user_games (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            game_id INTEGER NOT NULL,
            added_at TEXT NOT NULL
        )",
        // Denormalized reverse index of user_games, rebuilt by the background worker.
        "CREATE TABLE IF NOT EXISTS game_shelves (
            game_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL
        )",
    ];
    for ddl in DDL {
        sqlx::query(ddl).execute(&mut *conn).await?;
    }
    Ok(())
}

/// SQLite reports unique-index violations as a database error naming the column. Used to map
/// duplicate usernames and tag names onto typed errors.
pub(crate) fn is_unique_violation(e: &sqlx::Error, column: &str) -> bool {
    if let sqlx::Error::Database(de) = e {
        let msg = de.message();
        msg.contains("UNIQUE constraint failed") && msg.contains(column)
    } else {
        false
    }
}
