use actix_web::{http::header, test, test::TestRequest, web, web::ServiceConfig, App};
use shelf_engine::{access::GameScope, db_types::GameStatus, GameApi};

use super::{helpers::*, mocks::MockShelfDb};
use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    middleware::JwtAuthenticationFactory,
    routes::AdminListGamesRoute,
};

fn configure_app(config: AuthConfig, game_db: MockShelfDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let issuer = TokenIssuer::new(&config);
        let verifier = issuer.verifier();
        cfg.app_data(web::Data::new(GameApi::new(game_db))).app_data(web::Data::new(issuer)).service(
            web::scope("/api")
                .wrap(JwtAuthenticationFactory::new(verifier))
                .service(AdminListGamesRoute::<MockShelfDb>::new()),
        );
    }
}

#[actix_web::test]
async fn the_moderation_queue_sees_every_status() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let admin = seed_user(9, "adminUser", true);
    let mut db = MockShelfDb::new();
    db.expect_search_games()
        .withf(|scope, _| *scope == GameScope::All)
        .returning(|_, _| {
            Ok(vec![
                seed_game(1, "Candy Land", GameStatus::Approved),
                seed_game(2, "Gloomhaven", GameStatus::Pending),
                seed_game(3, "Munchkin", GameStatus::Rejected),
            ])
        });
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::get()
        .uri("/api/admin/games")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&admin, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success(), "was: {status} {body}");
    let games: serde_json::Value = serde_json::from_str(&body).unwrap();
    let statuses: Vec<&str> =
        games.as_array().unwrap().iter().map(|g| g["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["approved", "pending", "rejected"]);
}

#[actix_web::test]
async fn the_moderation_queue_accepts_the_same_narrowing_filters() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let admin = seed_user(9, "adminUser", true);
    let mut db = MockShelfDb::new();
    db.expect_search_games()
        .withf(|scope, filter| *scope == GameScope::All && filter.players == Some(7))
        .returning(|_, _| Ok(vec![seed_game(2, "Gloomhaven", GameStatus::Pending)]));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::get()
        .uri("/api/admin/games?players=7")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&admin, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success(), "was: {status} {body}");
}

#[actix_web::test]
async fn the_moderation_queue_requires_a_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_search_games().times(0);
    let app = test::init_service(App::new().configure(configure_app(AuthConfig::default(), db))).await;
    let req = TestRequest::get().uri("/api/admin/games").to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}

#[actix_web::test]
async fn the_moderation_queue_rejects_non_admins() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_search_games().times(0);
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::get()
        .uri("/api/admin/games")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}
