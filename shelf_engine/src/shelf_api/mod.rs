//! The shelf engine public API.
//!
//! These wrappers are what the server hands to its route handlers. Each one is generic over
//! the storage traits it needs, applies the authorization policy before touching the store,
//! and composes the mandatory moderation scope with client-supplied filters.

pub mod auth_api;
pub mod game_api;
pub mod tag_api;
pub mod user_api;

pub use auth_api::AuthApi;
pub use game_api::GameApi;
pub use tag_api::TagApi;
pub use user_api::UserApi;
