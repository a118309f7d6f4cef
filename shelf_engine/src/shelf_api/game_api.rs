use std::fmt::Debug;

use log::debug;

use crate::{
    access::{authorize, Action, GameScope},
    db_types::{Game, GameId, GameUpdate, NewGame, Principal},
    query::GameQueryFilter,
    traits::{GameApiError, GameManagement, UserManagement},
};

/// Catalog reads and moderation. Reads take the [`GameScope`] computed by the policy layer;
/// mutations re-check the policy here so no route wiring mistake can bypass it.
pub struct GameApi<B> {
    db: B,
}

impl<B: Debug> Debug for GameApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GameApi ({:?})", self.db)
    }
}

impl<B> GameApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> GameApi<B>
where B: GameManagement
{
    /// Searches the catalog within the given scope. The scope clause is ANDed with every
    /// client filter; there is no way to opt out of it.
    pub async fn search_games(&self, scope: GameScope, filter: GameQueryFilter) -> Result<Vec<Game>, GameApiError> {
        self.db.search_games(scope, filter).await
    }

    pub async fn fetch_game(&self, id: GameId, scope: GameScope) -> Result<Option<Game>, GameApiError> {
        self.db.fetch_game(id, scope).await
    }

    /// Admin-only partial update. A present `status` is the moderation transition; the value
    /// itself was validated at the edge, and any of the three states may follow any other.
    pub async fn update_game(
        &self,
        principal: &Principal,
        id: GameId,
        update: GameUpdate,
    ) -> Result<Option<Game>, GameApiError> {
        authorize(Some(principal), &Action::UpdateGame { touches_status: update.touches_status() })?;
        self.db.update_game(id, update).await
    }

    /// Admin-only catalog delete. The game record (with its tag links) and its shelf rows
    /// are removed concurrently and non-transactionally.
    pub async fn delete_game(&self, principal: &Principal, id: GameId) -> Result<(), GameApiError> {
        authorize(Some(principal), &Action::DeleteGame)?;
        let (deleted, pulled) = futures::join!(self.db.delete_game(id), self.db.pull_game_from_shelves(id));
        let shelf_rows = pulled.map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        debug!("🎲️ Pulled game {id} from {shelf_rows} shelves");
        if deleted? {
            Ok(())
        } else {
            Err(GameApiError::GameNotFound)
        }
    }

    /// Replaces the denormalized shelves index from current shelf membership. Runs from the
    /// background worker, never from a request handler.
    pub async fn rebuild_shelves(&self) -> Result<u64, GameApiError> {
        self.db.rebuild_shelves().await
    }

    pub async fn count_games(&self) -> Result<i64, GameApiError> {
        self.db.count_games().await
    }
}

impl<B> GameApi<B>
where B: GameManagement + UserManagement
{
    /// Submits a new game to the catalog. Any authenticated user may submit; the game starts
    /// out pending and lands on the submitter's shelf. Clients supply neither the status nor
    /// the ownership link.
    pub async fn create_game(&self, principal: &Principal, mut game: NewGame) -> Result<Game, GameApiError> {
        authorize(Some(principal), &Action::CreateGame)?;
        game.submitted_by = Some(principal.id);
        let game = self.db.insert_game(game).await?;
        self.db
            .add_game_to_shelf(principal.id, game.id)
            .await
            .map_err(|e| GameApiError::DatabaseError(e.to_string()))?;
        debug!("🎲️ New game {} ({}) submitted by {}", game.title, game.id, principal.username);
        Ok(game)
    }
}
