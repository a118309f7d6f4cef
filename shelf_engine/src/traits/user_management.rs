use crate::{
    db_types::{GameId, NewUser, User, UserId, UserUpdate},
    traits::UserApiError,
};

/// Behaviour for managing account records and shelf membership.
///
/// Implementations enforce username/email uniqueness and surface violations as the typed
/// errors on [`UserApiError`]. The shelf (`user_games`) preserves insertion order and allows
/// duplicates; callers that care should deduplicate themselves.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates a new account. The username must already be lowercased by the caller.
    async fn create_user(&self, user: NewUser) -> Result<User, UserApiError>;

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, UserApiError>;

    /// Looks an account up by its (lowercased) username.
    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, UserApiError>;

    /// Every account, ordered by username.
    async fn fetch_all_users(&self) -> Result<Vec<User>, UserApiError>;

    /// Applies a partial update, returning the updated record, or `None` if no such user.
    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<User>, UserApiError>;

    /// Deletes the account and its shelf rows. Returns false if no such user existed.
    async fn delete_user(&self, id: UserId) -> Result<bool, UserApiError>;

    /// Appends a game to the user's shelf.
    async fn add_game_to_shelf(&self, user_id: UserId, game_id: GameId) -> Result<(), UserApiError>;

    /// Removes every occurrence of the game from the user's shelf, returning the number of
    /// rows removed.
    async fn remove_game_from_shelf(&self, user_id: UserId, game_id: GameId) -> Result<u64, UserApiError>;
}
