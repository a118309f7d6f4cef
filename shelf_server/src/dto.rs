use serde::{Deserialize, Serialize};
use shelf_engine::query::GameQueryFilter;

use crate::errors::ServerError;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "authToken")]
    pub auth_token: String,
}

/// The narrowing query parameters accepted by the game list endpoints. `tagId` arrives as a
/// string so a malformed value surfaces as the id error rather than a generic parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameQueryParams {
    #[serde(rename = "searchTerm")]
    pub search_term: Option<String>,
    pub players: Option<i64>,
    #[serde(rename = "tagId")]
    pub tag_id: Option<String>,
}

impl GameQueryParams {
    pub fn into_filter(self) -> Result<GameQueryFilter, ServerError> {
        let tag_id = self.tag_id.as_deref().map(str::parse).transpose()?;
        Ok(GameQueryFilter { search_term: self.search_term, players: self.players, tag_id })
    }
}
