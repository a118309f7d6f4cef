use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------  Resource identifiers  -------------------------------------------------------

#[derive(Debug, Clone, Error)]
#[error("The id is not valid")]
pub struct InvalidIdError;

macro_rules! resource_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        /// Ids on the wire must be a plain positive integer. Anything else is structurally
        /// invalid and must be rejected before any policy or storage call is made.
        impl FromStr for $name {
            type Err = InvalidIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.parse::<i64>() {
                    Ok(n) if n > 0 => Ok(Self(n)),
                    _ => Err(InvalidIdError),
                }
            }
        }
    };
}

resource_id!(UserId);
resource_id!(GameId);
resource_id!(TagId);

//--------------------------------------      GameStatus       --------------------------------------------------------

/// The moderation state of a catalog game. New submissions always start out `Pending`; only
/// admins move a game between states, and every state is reachable from every other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Pending => write!(f, "pending"),
            GameStatus::Approved => write!(f, "approved"),
            GameStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("That is not a valid status")]
pub struct InvalidStatusError;

impl FromStr for GameStatus {
    type Err = InvalidStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(InvalidStatusError),
        }
    }
}

//--------------------------------------      TagCategory      --------------------------------------------------------

/// Tags live in a fixed, shared vocabulary. The category is optional, but when it is given it
/// must be one of these values; anything else is a rejected mutation, never a silent coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TagCategory {
    Mechanics,
    Themes,
}

impl Display for TagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagCategory::Mechanics => write!(f, "Mechanics"),
            TagCategory::Themes => write!(f, "Themes"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("That is not a valid category")]
pub struct InvalidCategoryError;

impl FromStr for TagCategory {
    type Err = InvalidCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mechanics" => Ok(Self::Mechanics),
            "Themes" => Ok(Self::Themes),
            _ => Err(InvalidCategoryError),
        }
    }
}

//--------------------------------------        User           --------------------------------------------------------

/// A registered account. The `games` list is the user's shelf, in the order games were added.
/// The password hash never leaves the server; it is skipped during serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub admin: bool,
    pub games: Vec<GameId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A new account record. Self-registration always constructs this with `admin: false`; the
/// flag only ever flips through the admin-gated update path.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: String,
    pub admin: bool,
}

/// Typed partial update for a user record. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub admin: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.name.is_none()
            && self.password_hash.is_none()
            && self.admin.is_none()
    }
}

//--------------------------------------      Principal        --------------------------------------------------------

/// The identity snapshot embedded in access tokens and attached to authenticated requests.
/// Deliberately excludes the password hash; claims are trusted as of issuance time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    pub name: Option<String>,
    pub admin: bool,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self { id: user.id, username: user.username.clone(), name: user.name.clone(), admin: user.admin }
    }
}

//--------------------------------------        Game           --------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// A catalog game. `shelves` is the denormalized list of every user currently holding the
/// game; it is rebuilt asynchronously and must not be treated as authoritative at write time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub title: String,
    pub players: PlayerRange,
    pub status: GameStatus,
    pub tags: Vec<TagId>,
    pub shelves: Vec<UserId>,
    #[serde(skip_serializing)]
    pub submitted_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A new catalog submission. The moderation status is not part of this type: every new game
/// starts out pending, no matter what the client sent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    pub title: String,
    pub players: PlayerRange,
    pub tags: Vec<TagId>,
    pub submitted_by: Option<UserId>,
}

/// Typed partial update for a game. A present `status` makes this an admin-only mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameUpdate {
    pub title: Option<String>,
    pub min_players: Option<i64>,
    pub max_players: Option<i64>,
    pub tags: Option<Vec<TagId>>,
    pub status: Option<GameStatus>,
}

impl GameUpdate {
    pub fn touches_status(&self) -> bool {
        self.status.is_some()
    }
}

//--------------------------------------         Tag           --------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TagCategory>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTag {
    pub name: String,
    pub category: Option<TagCategory>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagUpdate {
    pub name: String,
    pub category: Option<TagCategory>,
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use chrono::Utc;

    use super::*;

    #[test]
    fn status_parses_the_three_lifecycle_states() {
        assert_eq!(GameStatus::from_str("pending").unwrap(), GameStatus::Pending);
        assert_eq!(GameStatus::from_str("approved").unwrap(), GameStatus::Approved);
        assert_eq!(GameStatus::from_str("rejected").unwrap(), GameStatus::Rejected);
        assert_eq!(GameStatus::default(), GameStatus::Pending);
    }

    #[test]
    fn status_rejects_anything_else() {
        for s in ["Approved", "NOT-A-VALID-STATUS", "", "pending "] {
            let err = GameStatus::from_str(s).unwrap_err();
            assert_eq!(err.to_string(), "That is not a valid status");
        }
    }

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(GameId::from_str("42").unwrap(), GameId(42));
        for s in ["NOT-A-VALID-ID", "-1", "0", "1.5", "1abc", ""] {
            assert!(GameId::from_str(s).is_err(), "{s} should not parse");
        }
    }

    #[test]
    fn category_rejects_unknown_values() {
        assert_eq!(TagCategory::from_str("Mechanics").unwrap(), TagCategory::Mechanics);
        assert_eq!(TagCategory::from_str("Themes").unwrap(), TagCategory::Themes);
        assert!(TagCategory::from_str("mechanics").is_err());
        assert!(TagCategory::from_str("Other").is_err());
    }

    #[test]
    fn serialized_users_never_contain_the_password_hash() {
        let user = User {
            id: UserId(1),
            username: "anauser".to_string(),
            email: None,
            name: Some("Ana User".to_string()),
            password_hash: "$argon2id$v=19$secret".to_string(),
            admin: false,
            games: vec![GameId(3)],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.get("password").is_none());
        assert!(obj.get("passwordHash").is_none());
        assert_eq!(obj["username"], "anauser");
        assert_eq!(obj["games"], serde_json::json!([3]));
        assert!(obj.get("createdAt").is_some());
    }
}
