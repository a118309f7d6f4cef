//! Request-body validation.
//!
//! Bodies for the mutating routes arrive as raw JSON and are checked field by field against
//! an explicit allow-list, then assembled into the engine's typed structs. Unknown fields are
//! ignored, most importantly `admin` and `status` on the self-service paths, which clients
//! may send but never get to set.
//!
//! Two error styles coexist, matching the wire contract: account fields report structured
//! 422 validation errors with a field location; game and tag fields report plain 400
//! messages.

use serde_json::Value;
use shelf_engine::db_types::{GameStatus, GameUpdate, NewGame, PlayerRange, TagCategory, TagId, UserUpdate};

use crate::errors::ServerError;

fn validation_error(message: &str, location: &str) -> ServerError {
    ServerError::ValidationError { message: message.to_string(), location: location.to_string() }
}

/// A required account field: present, a string, trimmed, and within the length bounds.
fn account_field(
    body: &Value,
    field: &str,
    min_len: usize,
    max_len: usize,
) -> Result<String, ServerError> {
    let value = body.get(field).ok_or_else(|| validation_error("Missing field", field))?;
    let s = value.as_str().ok_or_else(|| validation_error("Incorrect field type: expected string", field))?;
    if s.trim() != s {
        return Err(validation_error("Cannot start or end with whitespace", field));
    }
    if s.len() < min_len {
        return Err(validation_error(&format!("Must be at least {min_len} characters long"), field));
    }
    if s.len() > max_len {
        return Err(validation_error(&format!("Must be at most {max_len} characters long"), field));
    }
    Ok(s.to_string())
}

/// An optional free-text account field (display name, email). Trimmed but otherwise free.
fn optional_account_field(body: &Value, field: &str) -> Result<Option<String>, ServerError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let s =
                value.as_str().ok_or_else(|| validation_error("Incorrect field type: expected string", field))?;
            Ok(Some(s.trim().to_string()))
        },
    }
}

/// Validates a registration body into (username, password, name, email). Any `admin` field
/// the client sent is not part of the result: self-registration always produces a regular
/// account.
pub fn validate_registration(body: &Value) -> Result<(String, String, Option<String>, Option<String>), ServerError> {
    let username = account_field(body, "username", 1, 72)?;
    let password = account_field(body, "password", 8, 72)?;
    let name = optional_account_field(body, "name")?;
    let email = optional_account_field(body, "email")?;
    Ok((username, password, name, email))
}

/// Validates a user-update body into a typed partial update plus the plaintext password (the
/// engine hashes it). Fields follow the registration rules when present; `admin` must be a
/// boolean and stays in the update so the policy can gate it.
pub fn validate_user_update(body: &Value) -> Result<(UserUpdate, Option<String>), ServerError> {
    let mut update = UserUpdate::default();
    if body.get("username").is_some() {
        update.username = Some(account_field(body, "username", 1, 72)?);
    }
    let password = if body.get("password").is_some() {
        Some(account_field(body, "password", 8, 72)?)
    } else {
        None
    };
    update.name = optional_account_field(body, "name")?;
    update.email = optional_account_field(body, "email")?;
    if let Some(value) = body.get("admin") {
        let flag =
            value.as_bool().ok_or_else(|| validation_error("Incorrect field type: expected boolean", "admin"))?;
        update.admin = Some(flag);
    }
    Ok((update, password))
}

fn players_field(body: &Value, field: &str) -> Result<Option<i64>, ServerError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| ServerError::BadRequest("`minPlayers` and `maxPlayers` should be numbers".to_string())),
    }
}

fn players_range(body: &Value) -> Result<PlayerRange, ServerError> {
    let min = players_field(body, "minPlayers")?;
    let max = players_field(body, "maxPlayers")?;
    if let (Some(min), Some(max)) = (min, max) {
        if max < min {
            return Err(ServerError::BadRequest(
                "`maxPlayers` should not be less than `minPlayers`".to_string(),
            ));
        }
    }
    Ok(PlayerRange { min, max })
}

fn tag_list(body: &Value) -> Result<Option<Vec<TagId>>, ServerError> {
    let invalid = || ServerError::BadRequest("The `tags` array contains an invalid `id`".to_string());
    match body.get("tags") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(values)) => {
            let mut tags = Vec::with_capacity(values.len());
            for value in values {
                let tag = match value {
                    Value::Number(n) => n.as_i64().filter(|n| *n > 0).map(TagId).ok_or_else(invalid)?,
                    Value::String(s) => s.parse::<TagId>().map_err(|_| invalid())?,
                    _ => return Err(invalid()),
                };
                tags.push(tag);
            }
            Ok(Some(tags))
        },
        Some(_) => Err(invalid()),
    }
}

fn required_title(body: &Value) -> Result<String, ServerError> {
    match body.get("title").and_then(Value::as_str) {
        Some(title) if !title.is_empty() => Ok(title.to_string()),
        _ => Err(ServerError::MissingFields(vec!["title".to_string()])),
    }
}

/// Validates a game submission. The moderation status is not read from the body at all: new
/// games start pending, whatever the client claims.
pub fn validate_new_game(body: &Value) -> Result<NewGame, ServerError> {
    let title = required_title(body)?;
    let players = players_range(body)?;
    let tags = tag_list(body)?.unwrap_or_default();
    Ok(NewGame { title, players, tags, submitted_by: None })
}

/// Validates an admin game update. The status value is checked here, before any mutation; a
/// value outside the three lifecycle states never reaches the store.
pub fn validate_game_update(body: &Value) -> Result<GameUpdate, ServerError> {
    let title = match body.get("title") {
        None => None,
        Some(_) => Some(required_title(body)?),
    };
    let players = players_range(body)?;
    let tags = tag_list(body)?;
    let status = match body.get("status") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let s = value.as_str().ok_or_else(|| ServerError::BadRequest("That is not a valid status".to_string()))?;
            Some(s.parse::<GameStatus>()?)
        },
    };
    Ok(GameUpdate { title, min_players: players.min, max_players: players.max, tags, status })
}

pub fn required_name(body: &Value) -> Result<String, ServerError> {
    match body.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ServerError::MissingFields(vec!["name".to_string()])),
    }
}

/// The tag category is a fixed enum; an unknown value is a rejected mutation, never a silent
/// coercion.
pub fn optional_category(body: &Value) -> Result<Option<TagCategory>, ServerError> {
    match body.get("category") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let s =
                value.as_str().ok_or_else(|| ServerError::BadRequest("That is not a valid category".to_string()))?;
            Ok(Some(s.parse::<TagCategory>()?))
        },
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn registration_requires_username_and_password() {
        let err = validate_registration(&json!({ "password": "examplePass" })).unwrap_err();
        assert!(matches!(err, ServerError::ValidationError { ref location, .. } if location == "username"));
        let err = validate_registration(&json!({ "username": "exampleUser" })).unwrap_err();
        assert!(matches!(err, ServerError::ValidationError { ref location, .. } if location == "password"));
    }

    #[test]
    fn registration_rejects_untrimmed_and_short_fields() {
        let err =
            validate_registration(&json!({ "username": " exampleUser ", "password": "examplePass" })).unwrap_err();
        assert_eq!(err.to_string(), "Cannot start or end with whitespace");
        let err = validate_registration(&json!({ "username": "exampleUser", "password": "1234567" })).unwrap_err();
        assert_eq!(err.to_string(), "Must be at least 8 characters long");
        let err =
            validate_registration(&json!({ "username": "exampleUser", "password": "a".repeat(73) })).unwrap_err();
        assert_eq!(err.to_string(), "Must be at most 72 characters long");
    }

    #[test]
    fn registration_rejects_non_string_fields() {
        let err = validate_registration(&json!({ "username": 1234, "password": "examplePass" })).unwrap_err();
        assert_eq!(err.to_string(), "Incorrect field type: expected string");
    }

    #[test]
    fn registration_ignores_a_submitted_admin_flag() {
        let body = json!({ "username": "exampleUser", "password": "examplePass", "admin": true });
        assert!(validate_registration(&body).is_ok());
    }

    #[test]
    fn new_games_need_a_title() {
        let err = validate_new_game(&json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Missing title in request body");
        let err = validate_new_game(&json!({ "title": "" })).unwrap_err();
        assert_eq!(err.to_string(), "Missing title in request body");
    }

    #[test]
    fn player_counts_must_be_numbers_in_order() {
        let body = json!({ "title": "Test Game", "minPlayers": "not a number", "maxPlayers": "not a number" });
        assert_eq!(validate_new_game(&body).unwrap_err().to_string(), "`minPlayers` and `maxPlayers` should be numbers");
        let body = json!({ "title": "Test Game", "minPlayers": 2, "maxPlayers": 1 });
        assert_eq!(
            validate_new_game(&body).unwrap_err().to_string(),
            "`maxPlayers` should not be less than `minPlayers`"
        );
    }

    #[test]
    fn tag_references_must_be_valid_ids() {
        let body = json!({ "title": "Example Game", "tags": ["NOT-A-VALID-ID"] });
        assert_eq!(validate_new_game(&body).unwrap_err().to_string(), "The `tags` array contains an invalid `id`");
        let body = json!({ "title": "Example Game", "tags": [3, "7"] });
        assert_eq!(validate_new_game(&body).unwrap().tags, vec![TagId(3), TagId(7)]);
    }

    #[test]
    fn game_updates_cannot_carry_a_made_up_status() {
        let err = validate_game_update(&json!({ "status": "NOT-A-VALID-STATUS" })).unwrap_err();
        assert_eq!(err.to_string(), "That is not a valid status");
        let update = validate_game_update(&json!({ "status": "approved" })).unwrap();
        assert_eq!(update.status, Some(GameStatus::Approved));
        assert!(update.touches_status());
    }

    #[test]
    fn the_admin_flag_must_be_boolean_on_update() {
        let err = validate_user_update(&json!({ "admin": "yes" })).unwrap_err();
        assert!(matches!(err, ServerError::ValidationError { ref location, .. } if location == "admin"));
        let (update, _) = validate_user_update(&json!({ "admin": true })).unwrap();
        assert_eq!(update.admin, Some(true));
    }

    #[test]
    fn categories_are_a_closed_set() {
        assert!(optional_category(&json!({ "category": "Mechanics" })).unwrap().is_some());
        let err = optional_category(&json!({ "category": "Vibes" })).unwrap_err();
        assert_eq!(err.to_string(), "That is not a valid category");
    }
}
