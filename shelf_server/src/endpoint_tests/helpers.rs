use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header::HeaderMap, StatusCode},
    test,
};
use chrono::Utc;
use shelf_engine::db_types::{Game, GameId, GameStatus, PlayerRange, Principal, Tag, TagId, User, UserId};

use crate::{auth::TokenIssuer, config::AuthConfig};

pub fn seed_user(id: i64, username: &str, admin: bool) -> User {
    let now = Utc::now();
    User {
        id: UserId(id),
        username: username.to_lowercase(),
        email: None,
        name: Some("Example User".to_string()),
        password_hash: shelf_engine::password::hash_password("examplePass").unwrap(),
        admin,
        games: vec![],
        created_at: now,
        updated_at: now,
    }
}

pub fn seed_game(id: i64, title: &str, status: GameStatus) -> Game {
    let now = Utc::now();
    Game {
        id: GameId(id),
        title: title.to_string(),
        players: PlayerRange { min: Some(2), max: Some(8) },
        status,
        tags: vec![],
        shelves: vec![],
        submitted_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn seed_tag(id: i64, name: &str) -> Tag {
    let now = Utc::now();
    Tag { id: TagId(id), name: name.to_string(), category: None, created_at: now, updated_at: now }
}

pub fn token_for(user: &User, config: &AuthConfig) -> String {
    TokenIssuer::new(config).issue_token(Principal::from(user), None).unwrap()
}

/// Runs a request through the app and normalizes the outcome to (status, headers, body),
/// whether the response came from a handler or from a middleware rejection.
pub async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, HeaderMap, String)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match app.call(req).await {
        Ok(res) => {
            let status = res.status();
            let headers = res.headers().clone();
            let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
            (status, headers, body)
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let headers = res.headers().clone();
            let body =
                String::from_utf8_lossy(&actix_web::body::to_bytes(res.into_body()).await.unwrap_or_default())
                    .into_owned();
            (status, headers, body)
        },
    }
}
