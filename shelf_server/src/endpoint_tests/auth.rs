use actix_web::{http::header, test, test::TestRequest, web, web::ServiceConfig, App};
use shelf_engine::{AuthApi, UserApi};

use super::{helpers::*, mocks::MockShelfDb};
use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    dto::TokenResponse,
    middleware::JwtAuthenticationFactory,
    routes::{HardRefreshRoute, LoginRoute, RefreshRoute},
};

fn configure_app(
    config: AuthConfig,
    auth_db: MockShelfDb,
    user_db: MockShelfDb,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let issuer = TokenIssuer::new(&config);
        let verifier = issuer.verifier();
        cfg.app_data(web::Data::new(AuthApi::new(auth_db)))
            .app_data(web::Data::new(UserApi::new(user_db)))
            .app_data(web::Data::new(issuer))
            .service(
                web::scope("/api")
                    .wrap(JwtAuthenticationFactory::new(verifier))
                    .service(LoginRoute::<MockShelfDb>::new())
                    .service(RefreshRoute::new())
                    .service(HardRefreshRoute::<MockShelfDb>::new()),
            );
    }
}

#[actix_web::test]
async fn login_with_valid_credentials_returns_a_token() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(7, "exampleUser", false);
    let mut auth_db = MockShelfDb::new();
    let reply = user.clone();
    auth_db
        .expect_fetch_user_by_username()
        .withf(|username| username == "exampleuser")
        .returning(move |_| Ok(Some(reply.clone())));
    let app =
        test::init_service(App::new().configure(configure_app(config.clone(), auth_db, MockShelfDb::new()))).await;
    let req = TestRequest::post()
        .uri("/api/login")
        .set_json(serde_json::json!({ "username": "exampleUser", "password": "examplePass" }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success(), "was: {status} {body}");
    let token: TokenResponse = serde_json::from_str(&body).unwrap();
    let claims = TokenIssuer::new(&config).verifier().decode_token(&token.auth_token).unwrap();
    assert_eq!(claims.sub, "exampleuser");
    assert_eq!(claims.user.id, user.id);
    assert!(!claims.user.admin);
    // The embedded principal must not leak credential material.
    let claims_json = serde_json::to_value(&claims).unwrap();
    assert!(claims_json["user"].get("password").is_none());
    assert!(claims_json["user"].get("passwordHash").is_none());
}

#[actix_web::test]
async fn login_failures_are_indistinguishable() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();

    // Wrong password for a known account.
    let user = seed_user(7, "exampleUser", false);
    let mut known = MockShelfDb::new();
    known.expect_fetch_user_by_username().returning(move |_| Ok(Some(user.clone())));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), known, MockShelfDb::new()))).await;
    let req = TestRequest::post()
        .uri("/api/login")
        .set_json(serde_json::json!({ "username": "exampleUser", "password": "wrongPass" }))
        .to_request();
    let (status, _, wrong_password_body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);

    // Unknown account.
    let mut unknown = MockShelfDb::new();
    unknown.expect_fetch_user_by_username().returning(|_| Ok(None));
    let app = test::init_service(App::new().configure(configure_app(config, unknown, MockShelfDb::new()))).await;
    let req = TestRequest::post()
        .uri("/api/login")
        .set_json(serde_json::json!({ "username": "nobody", "password": "examplePass" }))
        .to_request();
    let (status, _, unknown_user_body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);

    assert_eq!(wrong_password_body, unknown_user_body);
    assert_eq!(wrong_password_body, r#"{"message":"Unauthorized"}"#);
}

#[actix_web::test]
async fn login_without_credentials_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_fetch_user_by_username().times(0);
    let app =
        test::init_service(App::new().configure(configure_app(AuthConfig::default(), db, MockShelfDb::new()))).await;
    let req = TestRequest::post().uri("/api/login").set_json(serde_json::json!({})).to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}

#[actix_web::test]
async fn refresh_reissues_identical_claims() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(7, "exampleUser", false);
    let token = token_for(&user, &config);
    let app = test::init_service(
        App::new().configure(configure_app(config.clone(), MockShelfDb::new(), MockShelfDb::new())),
    )
    .await;

    let mut tokens = vec![];
    for _ in 0..2 {
        let req = TestRequest::post()
            .uri("/api/refresh")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let (status, _, body) = send(&app, req).await;
        assert!(status.is_success(), "was: {status} {body}");
        let fresh: TokenResponse = serde_json::from_str(&body).unwrap();
        tokens.push(fresh.auth_token);
    }
    // Both refreshed tokens verify independently and carry the same principal.
    let verifier = TokenIssuer::new(&config).verifier();
    let first = verifier.decode_token(&tokens[0]).unwrap();
    let second = verifier.decode_token(&tokens[1]).unwrap();
    assert_eq!(first.user, second.user);
    assert_eq!(first.sub, second.sub);
    assert_eq!(first.user.username, "exampleuser");
}

#[actix_web::test]
async fn refresh_without_a_token_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(
        App::new().configure(configure_app(AuthConfig::default(), MockShelfDb::new(), MockShelfDb::new())),
    )
    .await;
    let req = TestRequest::post().uri("/api/refresh").to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}

#[actix_web::test]
async fn refresh_with_a_garbage_token_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(
        App::new().configure(configure_app(AuthConfig::default(), MockShelfDb::new(), MockShelfDb::new())),
    )
    .await;
    let req = TestRequest::post()
        .uri("/api/refresh")
        .insert_header((header::AUTHORIZATION, "Bearer made.up.nonsense"))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}

#[actix_web::test]
async fn refresh_with_a_token_from_another_secret_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let user = seed_user(7, "exampleUser", false);
    let foreign_token = token_for(&user, &AuthConfig::default());
    let app = test::init_service(
        App::new().configure(configure_app(AuthConfig::default(), MockShelfDb::new(), MockShelfDb::new())),
    )
    .await;
    let req = TestRequest::post()
        .uri("/api/refresh")
        .insert_header((header::AUTHORIZATION, format!("Bearer {foreign_token}")))
        .to_request();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
}

#[actix_web::test]
async fn hard_refresh_picks_up_current_account_data() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let stale = seed_user(7, "exampleUser", false);
    let token = token_for(&stale, &config);

    // The account was renamed (and promoted) since the token was issued.
    let mut current = seed_user(7, "exampleUser", true);
    current.name = Some("Renamed User".to_string());
    let mut user_db = MockShelfDb::new();
    let reply = current.clone();
    user_db.expect_fetch_user().withf(|id| id.value() == 7).returning(move |_| Ok(Some(reply.clone())));

    let app =
        test::init_service(App::new().configure(configure_app(config.clone(), MockShelfDb::new(), user_db))).await;
    let req = TestRequest::post()
        .uri("/api/hard-refresh")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success(), "was: {status} {body}");
    let fresh: TokenResponse = serde_json::from_str(&body).unwrap();
    let claims = TokenIssuer::new(&config).verifier().decode_token(&fresh.auth_token).unwrap();
    assert_eq!(claims.user.name.as_deref(), Some("Renamed User"));
    assert!(claims.user.admin);
}

#[actix_web::test]
async fn hard_refresh_for_a_deleted_account_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(7, "exampleUser", false);
    let token = token_for(&user, &config);
    let mut user_db = MockShelfDb::new();
    user_db.expect_fetch_user().returning(|_| Ok(None));
    let app = test::init_service(App::new().configure(configure_app(config, MockShelfDb::new(), user_db))).await;
    let req = TestRequest::post()
        .uri("/api/hard-refresh")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}
