use std::fmt::Debug;

use log::debug;

use crate::{
    db_types::User,
    password,
    traits::{AuthApiError, UserManagement},
};

/// Credential verification for the login route.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where B: UserManagement
{
    /// Verifies a username/password pair against the store.
    ///
    /// The username is lowercased before lookup. An unknown username and a wrong password
    /// both come back as [`AuthApiError::InvalidCredentials`]; callers must not be able to
    /// tell the two apart. Fails without side effects.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthApiError> {
        let username = username.to_lowercase();
        let user = self
            .db
            .fetch_user_by_username(&username)
            .await
            .map_err(|e| AuthApiError::DatabaseError(e.to_string()))?
            .ok_or(AuthApiError::InvalidCredentials)?;
        if password::verify_password(password, &user.password_hash)? {
            debug!("🔑️ Credentials verified for {username}");
            Ok(user)
        } else {
            debug!("🔑️ Password mismatch for {username}");
            Err(AuthApiError::InvalidCredentials)
        }
    }
}
