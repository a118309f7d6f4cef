use crate::{
    access::GameScope,
    db_types::{Game, GameId, GameUpdate, NewGame, UserId},
    query::GameQueryFilter,
    traits::GameApiError,
};

/// Behaviour for the shared game catalog.
///
/// Read operations take a [`GameScope`]: the moderation filter computed by the policy layer.
/// The scope clause is always applied, AND-ed with whatever narrowing filter the client
/// supplied, so a pending or rejected game can never leak onto a public read path.
#[allow(async_fn_in_trait)]
pub trait GameManagement {
    /// Inserts a new submission. Status is always `pending` on insert.
    async fn insert_game(&self, game: NewGame) -> Result<Game, GameApiError>;

    async fn fetch_game(&self, id: GameId, scope: GameScope) -> Result<Option<Game>, GameApiError>;

    /// Searches the catalog. Results are sorted ascending by title.
    async fn search_games(&self, scope: GameScope, filter: GameQueryFilter) -> Result<Vec<Game>, GameApiError>;

    /// Applies a partial update, returning the updated record, or `None` if no such game.
    async fn update_game(&self, id: GameId, update: GameUpdate) -> Result<Option<Game>, GameApiError>;

    /// Deletes the game and its tag links. Returns false if no such game existed.
    async fn delete_game(&self, id: GameId) -> Result<bool, GameApiError>;

    /// Removes the game from every user's shelf, returning the number of shelf rows removed.
    async fn pull_game_from_shelves(&self, id: GameId) -> Result<u64, GameApiError>;

    /// Deletes every game submitted by the given user, along with their tag links. Part of
    /// the account-deletion cascade.
    async fn delete_games_submitted_by(&self, user_id: UserId) -> Result<u64, GameApiError>;

    /// Rebuilds the denormalized `shelves` reverse index from shelf membership. Returns the
    /// number of index rows written. Eventually consistent; runs off the request path.
    async fn rebuild_shelves(&self) -> Result<u64, GameApiError>;

    async fn count_games(&self) -> Result<i64, GameApiError>;
}
