//! Shelf Engine
//!
//! The storage and access-control engine behind the board game shelf API. It is
//! provider-agnostic: the HTTP server never talks to a database directly but goes through
//! the public API wrappers, which are generic over the storage traits.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly; use the public API instead. The
//!    exception is the data types, defined in [`mod@db_types`], which are public.
//! 2. The authorization policy ([`mod@access`]). One pure decision function covers every
//!    guarded operation, and the moderation scope for catalog reads is computed here so no
//!    route can forget to apply it.
//! 3. The engine public API ([`mod@shelf_api`]). Credential verification, accounts and
//!    shelves, the moderated game catalog, and the shared tag vocabulary. Backends implement
//!    the traits in [`mod@traits`] to serve these APIs.

mod sqlite;

pub mod access;
pub mod db_types;
pub mod password;
pub mod query;
pub mod traits;

mod shelf_api;

pub use shelf_api::{auth_api::AuthApi, game_api::GameApi, tag_api::TagApi, user_api::UserApi};
pub use sqlite::SqliteDatabase;
