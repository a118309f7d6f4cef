//! Password hashing. A thin wrapper around argon2 so the rest of the engine only sees an
//! opaque one-way function: hash on registration, verify on login.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2,
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Password hashing error: {0}")]
pub struct PasswordHashError(String);

/// Hashes a password into a PHC string suitable for storage.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordHashError(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verifies a submitted password against a stored PHC string. A mismatch returns `Ok(false)`;
/// an unparseable stored hash is a server-side fault, not a credential failure.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordHashError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| PasswordHashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let hash = hash_password("examplePass").unwrap();
        assert_ne!(hash, "examplePass");
        assert!(verify_password("examplePass", &hash).unwrap());
        assert!(!verify_password("wrongPass", &hash).unwrap());
    }

    #[test]
    fn garbage_stored_hash_is_an_error_not_a_mismatch() {
        assert!(verify_password("examplePass", "not-a-phc-string").is_err());
    }
}
