use std::fmt::Debug;

use log::debug;

use crate::{
    access::{authorize, Action},
    db_types::{GameId, NewUser, Principal, User, UserId, UserUpdate},
    password,
    traits::{GameManagement, UserApiError, UserManagement},
};

/// Account management: registration, profile reads and updates, account deletion, and shelf
/// membership.
pub struct UserApi<B> {
    db: B,
}

impl<B: Debug> Debug for UserApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserApi ({:?})", self.db)
    }
}

impl<B> UserApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> UserApi<B>
where B: UserManagement
{
    /// Self-service registration. Always produces a non-admin account: the admin flag is not
    /// a parameter here, no matter what the client submitted.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<User, UserApiError> {
        let password_hash = password::hash_password(password)?;
        let user = NewUser { username: username.to_lowercase(), email, name, password_hash, admin: false };
        let user = self.db.create_user(user).await?;
        debug!("👤️ Registered new user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn fetch_user(&self, id: UserId) -> Result<Option<User>, UserApiError> {
        self.db.fetch_user(id).await
    }

    pub async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, UserApiError> {
        self.db.fetch_user_by_username(&username.to_lowercase()).await
    }

    pub async fn list_users(&self, principal: &Principal) -> Result<Vec<User>, UserApiError> {
        authorize(Some(principal), &Action::ListUsers)?;
        self.db.fetch_all_users().await
    }

    /// Applies a partial update to the target account. The acting principal must be the
    /// target, except that touching the `admin` flag requires an acting admin.
    pub async fn update_user(
        &self,
        principal: &Principal,
        target: UserId,
        mut update: UserUpdate,
        new_password: Option<&str>,
    ) -> Result<Option<User>, UserApiError> {
        authorize(Some(principal), &Action::UpdateUser { target, touches_admin: update.admin.is_some() })?;
        if let Some(password) = new_password {
            update.password_hash = Some(password::hash_password(password)?);
        }
        if let Some(username) = update.username.take() {
            update.username = Some(username.to_lowercase());
        }
        self.db.update_user(target, update).await
    }

    /// Adds a game to the principal's own shelf. Duplicates are allowed by design (and
    /// discouraged); insertion order is preserved.
    pub async fn add_game_to_shelf(
        &self,
        principal: &Principal,
        target: UserId,
        game_id: GameId,
    ) -> Result<(), UserApiError> {
        authorize(Some(principal), &Action::EditShelf { target })?;
        self.db.add_game_to_shelf(target, game_id).await
    }

    pub async fn remove_game_from_shelf(
        &self,
        principal: &Principal,
        target: UserId,
        game_id: GameId,
    ) -> Result<u64, UserApiError> {
        authorize(Some(principal), &Action::EditShelf { target })?;
        self.db.remove_game_from_shelf(target, game_id).await
    }
}

impl<B> UserApi<B>
where B: UserManagement + GameManagement
{
    /// Deletes the principal's own account, cascading to the games they submitted. There is
    /// no admin override.
    ///
    /// The account row (with its shelf) and the submitted games are removed as two
    /// concurrent, independent operations. This is deliberately not transactional: a crash
    /// in between can leave orphaned games behind, which nothing detects or repairs.
    pub async fn delete_user(&self, principal: &Principal, target: UserId) -> Result<(), UserApiError> {
        authorize(Some(principal), &Action::DeleteUser { target })?;
        let (games, deleted) =
            futures::join!(self.db.delete_games_submitted_by(target), self.db.delete_user(target));
        let removed = games.map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
        debug!("👤️ Removed {removed} games submitted by user {target}");
        if deleted? {
            Ok(())
        } else {
            Err(UserApiError::UserNotFound)
        }
    }
}
