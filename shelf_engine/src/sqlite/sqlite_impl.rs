//! `SqliteDatabase` is the concrete storage backend for the shelf engine. It implements all
//! the traits defined in the [`crate::traits`] module on top of a shared connection pool.

use std::fmt::Debug;

use sqlx::SqlitePool;

use super::db::{create_schema, games, new_pool, tags, users};
use crate::{
    access::GameScope,
    db_types::{Game, GameId, GameUpdate, NewGame, NewTag, NewUser, Tag, TagId, TagUpdate, User, UserId, UserUpdate},
    query::GameQueryFilter,
    traits::{GameApiError, GameManagement, TagApiError, TagManagement, UserApiError, UserManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database and creates the schema if needed. Called once at startup;
    /// the pool is the only piece of state shared between request tasks.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        let mut conn = pool.acquire().await?;
        create_schema(&mut conn).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl UserManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, UserApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
        users::create_user(user, &mut conn).await
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
        users::fetch_user(id, &mut conn).await
    }

    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
        users::fetch_user_by_username(username, &mut conn).await
    }

    async fn fetch_all_users(&self) -> Result<Vec<User>, UserApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
        users::fetch_all_users(&mut conn).await
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
        users::update_user(id, update, &mut conn).await
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, UserApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
        users::delete_user(id, &mut conn).await
    }

    async fn add_game_to_shelf(&self, user_id: UserId, game_id: GameId) -> Result<(), UserApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
        users::add_game_to_shelf(user_id, game_id, &mut conn).await
    }

    async fn remove_game_from_shelf(&self, user_id: UserId, game_id: GameId) -> Result<u64, UserApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
        users::remove_game_from_shelf(user_id, game_id, &mut conn).await
    }
}

impl GameManagement for SqliteDatabase {
    async fn insert_game(&self, game: NewGame) -> Result<Game, GameApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        games::insert_game(game, &mut conn).await
    }

    async fn fetch_game(&self, id: GameId, scope: GameScope) -> Result<Option<Game>, GameApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        games::fetch_game(id, scope, &mut conn).await
    }

    async fn search_games(&self, scope: GameScope, filter: GameQueryFilter) -> Result<Vec<Game>, GameApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        games::search_games(scope, filter, &mut conn).await
    }

    async fn update_game(&self, id: GameId, update: GameUpdate) -> Result<Option<Game>, GameApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        games::update_game(id, update, &mut conn).await
    }

    async fn delete_game(&self, id: GameId) -> Result<bool, GameApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        games::delete_game(id, &mut conn).await
    }

    async fn pull_game_from_shelves(&self, id: GameId) -> Result<u64, GameApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        games::pull_game_from_shelves(id, &mut conn).await
    }

    async fn delete_games_submitted_by(&self, user_id: UserId) -> Result<u64, GameApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        games::delete_games_submitted_by(user_id, &mut conn).await
    }

    async fn rebuild_shelves(&self) -> Result<u64, GameApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        games::rebuild_shelves(&mut conn).await
    }

    async fn count_games(&self) -> Result<i64, GameApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        games::count_games(&mut conn).await
    }
}

impl TagManagement for SqliteDatabase {
    async fn insert_tag(&self, tag: NewTag) -> Result<Tag, TagApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| TagApiError::DatabaseError(e.to_string()))?;
        tags::insert_tag(tag, &mut conn).await
    }

    async fn fetch_tag(&self, id: TagId) -> Result<Option<Tag>, TagApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| TagApiError::DatabaseError(e.to_string()))?;
        tags::fetch_tag(id, &mut conn).await
    }

    async fn fetch_all_tags(&self) -> Result<Vec<Tag>, TagApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| TagApiError::DatabaseError(e.to_string()))?;
        tags::fetch_all_tags(&mut conn).await
    }

    async fn update_tag(&self, id: TagId, update: TagUpdate) -> Result<Option<Tag>, TagApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| TagApiError::DatabaseError(e.to_string()))?;
        tags::update_tag(id, update, &mut conn).await
    }

    async fn delete_tag(&self, id: TagId) -> Result<bool, TagApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| TagApiError::DatabaseError(e.to_string()))?;
        tags::delete_tag(id, &mut conn).await
    }

    async fn detach_tag_from_games(&self, id: TagId) -> Result<u64, TagApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| TagApiError::DatabaseError(e.to_string()))?;
        tags::detach_tag_from_games(id, &mut conn).await
    }
}
