use thiserror::Error;

use crate::{access::PolicyError, password::PasswordHashError};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    /// Unknown username and wrong password collapse into this one variant so the two cases
    /// are indistinguishable to the caller.
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    HashingError(#[from] PasswordHashError),
}

#[derive(Debug, Clone, Error)]
pub enum UserApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Email already taken")]
    EmailTaken,
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    PolicyViolation(#[from] PolicyError),
    #[error(transparent)]
    HashingError(#[from] PasswordHashError),
}

#[derive(Debug, Clone, Error)]
pub enum GameApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Game not found")]
    GameNotFound,
    #[error(transparent)]
    PolicyViolation(#[from] PolicyError),
}

#[derive(Debug, Clone, Error)]
pub enum TagApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Tag name already exists")]
    DuplicateTagName,
    #[error("Tag not found")]
    TagNotFound,
    #[error(transparent)]
    PolicyViolation(#[from] PolicyError),
}
