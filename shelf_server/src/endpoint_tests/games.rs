use actix_web::{http::header, test, test::TestRequest, web, web::ServiceConfig, App};
use serde_json::json;
use shelf_engine::{access::GameScope, db_types::GameStatus, GameApi};

use super::{helpers::*, mocks::MockShelfDb};
use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    middleware::JwtAuthenticationFactory,
    routes::{CreateGameRoute, DeleteGameRoute, GetGameRoute, ListGamesRoute, UpdateGameRoute},
};

fn configure_app(config: AuthConfig, game_db: MockShelfDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let issuer = TokenIssuer::new(&config);
        let verifier = issuer.verifier();
        cfg.app_data(web::Data::new(GameApi::new(game_db))).app_data(web::Data::new(issuer)).service(
            web::scope("/api")
                .wrap(JwtAuthenticationFactory::new(verifier))
                .service(ListGamesRoute::<MockShelfDb>::new())
                .service(CreateGameRoute::<MockShelfDb>::new())
                .service(GetGameRoute::<MockShelfDb>::new())
                .service(UpdateGameRoute::<MockShelfDb>::new())
                .service(DeleteGameRoute::<MockShelfDb>::new()),
        );
    }
}

//----------------------------------------------   Public reads  ----------------------------------------------------

#[actix_web::test]
async fn the_public_list_is_scoped_to_approved_games() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_search_games()
        .withf(|scope, filter| *scope == GameScope::ApprovedOnly && filter.is_empty())
        .returning(|_, _| {
            Ok(vec![
                seed_game(1, "Candy Land", GameStatus::Approved),
                seed_game(2, "Tokaido", GameStatus::Approved),
            ])
        });
    let app = test::init_service(App::new().configure(configure_app(AuthConfig::default(), db))).await;
    let req = TestRequest::get().uri("/api/games").to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success());
    let games: serde_json::Value = serde_json::from_str(&body).unwrap();
    let games = games.as_array().unwrap();
    assert_eq!(games.len(), 2);
    for game in games {
        assert_eq!(game["status"], "approved");
        assert!(game.get("players").is_some());
        assert!(game.get("createdAt").is_some());
    }
}

#[actix_web::test]
async fn the_player_count_filter_is_passed_through_with_the_moderation_clause() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_search_games()
        .withf(|scope, filter| *scope == GameScope::ApprovedOnly && filter.players == Some(7))
        .returning(|_, _| Ok(vec![seed_game(3, "King of New York", GameStatus::Approved)]));
    let app = test::init_service(App::new().configure(configure_app(AuthConfig::default(), db))).await;
    let req = TestRequest::get().uri("/api/games?players=7").to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success(), "was: {status} {body}");
    let games: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(games.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn search_term_and_tag_filters_are_passed_through() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_search_games()
        .withf(|scope, filter| {
            *scope == GameScope::ApprovedOnly
                && filter.search_term.as_deref() == Some("king")
                && filter.tag_id.map(|t| t.value()) == Some(3)
        })
        .returning(|_, _| Ok(vec![]));
    let app = test::init_service(App::new().configure(configure_app(AuthConfig::default(), db))).await;
    let req = TestRequest::get().uri("/api/games?searchTerm=king&tagId=3").to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success());
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn a_malformed_tag_filter_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_search_games().times(0);
    let app = test::init_service(App::new().configure(configure_app(AuthConfig::default(), db))).await;
    let req = TestRequest::get().uri("/api/games?tagId=NOT-A-VALID-ID").to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 400);
    assert_eq!(body, r#"{"message":"The id is not valid"}"#);
}

#[actix_web::test]
async fn detail_reads_use_the_approved_scope() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    // The store is asked with the approved-only scope, so a pending game comes back as None.
    db.expect_fetch_game()
        .withf(|id, scope| id.value() == 4 && *scope == GameScope::ApprovedOnly)
        .returning(|_, _| Ok(None));
    let app = test::init_service(App::new().configure(configure_app(AuthConfig::default(), db))).await;
    let req = TestRequest::get().uri("/api/games/4").to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 404);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn malformed_game_ids_are_rejected_before_any_lookup() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_fetch_game().times(0);
    let app = test::init_service(App::new().configure(configure_app(AuthConfig::default(), db))).await;
    let req = TestRequest::get().uri("/api/games/NOT-A-VALID-ID").to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 400);
    assert_eq!(body, r#"{"message":"The id is not valid"}"#);
}

//----------------------------------------------   Submission  ----------------------------------------------------

#[actix_web::test]
async fn submissions_start_pending_and_land_on_the_submitters_shelf() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_insert_game()
        // The creator link is attached server-side; the client can neither set it nor the status.
        .withf(|game| game.title == "Test Game" && game.submitted_by.map(|u| u.value()) == Some(1))
        .returning(|_| Ok(seed_game(10, "Test Game", GameStatus::Pending)));
    db.expect_add_game_to_shelf()
        .withf(|user_id, game_id| user_id.value() == 1 && game_id.value() == 10)
        .times(1)
        .returning(|_, _| Ok(()));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::post()
        .uri("/api/games")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .set_json(json!({ "title": "Test Game", "status": "approved" }))
        .to_request();
    let (status, headers, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 201, "was: {status} {body}");
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/api/games/10");
    let game: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(game["status"], "pending");
    assert_eq!(game["title"], "Test Game");
}

#[actix_web::test]
async fn anonymous_submissions_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_insert_game().times(0);
    let app = test::init_service(App::new().configure(configure_app(AuthConfig::default(), db))).await;
    let req = TestRequest::post().uri("/api/games").set_json(json!({ "title": "Test Game" })).to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}

#[actix_web::test]
async fn submissions_are_validated_before_the_store_is_touched() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_insert_game().times(0);
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let token = token_for(&user, &config);

    let cases = [
        (json!({}), "Missing title in request body"),
        (json!({ "title": "" }), "Missing title in request body"),
        (
            json!({ "title": "Test Game", "minPlayers": "not a number", "maxPlayers": "not a number" }),
            "`minPlayers` and `maxPlayers` should be numbers",
        ),
        (
            json!({ "title": "Test Game", "minPlayers": 2, "maxPlayers": 1 }),
            "`maxPlayers` should not be less than `minPlayers`",
        ),
        (json!({ "title": "Example Game", "tags": ["NOT-A-VALID-ID"] }), "The `tags` array contains an invalid `id`"),
    ];
    for (payload, message) in cases {
        let req = TestRequest::post()
            .uri("/api/games")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .set_json(payload.clone())
            .to_request();
        let (status, _, body) = send(&app, req).await;
        assert_eq!(status.as_u16(), 400, "payload: {payload}");
        let err: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(err["message"], message, "payload: {payload}");
    }
}

//----------------------------------------------   Moderation  ----------------------------------------------------

#[actix_web::test]
async fn admins_move_games_between_every_status() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let admin = seed_user(9, "adminUser", true);
    let app_token = token_for(&admin, &config);

    for (value, expected) in [("approved", GameStatus::Approved), ("rejected", GameStatus::Rejected)] {
        let mut db = MockShelfDb::new();
        let status_match = expected;
        db.expect_update_game()
            .withf(move |id, update| id.value() == 5 && update.status == Some(status_match))
            .times(1)
            .returning(move |_, _| Ok(Some(seed_game(5, "Monopoly", status_match))));
        let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
        let req = TestRequest::put()
            .uri("/api/games/5")
            .insert_header((header::AUTHORIZATION, format!("Bearer {app_token}")))
            .set_json(json!({ "status": value }))
            .to_request();
        let (status, _, body) = send(&app, req).await;
        assert!(status.is_success(), "was: {status} {body}");
        let game: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(game["status"], value);
    }
}

#[actix_web::test]
async fn non_admins_may_not_update_games_and_nothing_is_mutated() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_update_game().times(0);
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::put()
        .uri("/api/games/5")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .set_json(json!({ "status": "approved" }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}

#[actix_web::test]
async fn an_unknown_status_is_rejected_before_any_mutation() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let admin = seed_user(9, "adminUser", true);
    let mut db = MockShelfDb::new();
    db.expect_update_game().times(0);
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::put()
        .uri("/api/games/5")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&admin, &config))))
        .set_json(json!({ "status": "NOT-A-VALID-STATUS" }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 400);
    assert_eq!(body, r#"{"message":"That is not a valid status"}"#);
}

#[actix_web::test]
async fn updating_a_missing_game_is_a_404() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let admin = seed_user(9, "adminUser", true);
    let mut db = MockShelfDb::new();
    db.expect_update_game().returning(|_, _| Ok(None));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::put()
        .uri("/api/games/999")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&admin, &config))))
        .set_json(json!({ "title": "Updated Title" }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 404);
    assert!(body.is_empty());
}

//----------------------------------------------   Deletion  ----------------------------------------------------

#[actix_web::test]
async fn admins_delete_games_and_shelves_are_swept() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let admin = seed_user(9, "adminUser", true);
    let mut db = MockShelfDb::new();
    db.expect_delete_game().withf(|id| id.value() == 5).times(1).returning(|_| Ok(true));
    db.expect_pull_game_from_shelves().withf(|id| id.value() == 5).times(1).returning(|_| Ok(3));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::delete()
        .uri("/api/games/5")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&admin, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 204, "was: {status} {body}");
    assert!(body.is_empty());
}

#[actix_web::test]
async fn non_admins_may_not_delete_games() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_delete_game().times(0);
    db.expect_pull_game_from_shelves().times(0);
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::delete()
        .uri("/api/games/5")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}
