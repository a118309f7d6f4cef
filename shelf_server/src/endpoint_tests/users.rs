use actix_web::{http::header, test, test::TestRequest, web, web::ServiceConfig, App};
use serde_json::json;
use shelf_engine::{
    db_types::{GameStatus, UserId},
    GameApi,
    UserApi,
};

use super::{helpers::*, mocks::MockShelfDb};
use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    middleware::JwtAuthenticationFactory,
    routes::{
        AddGameToShelfRoute,
        DeleteUserRoute,
        GetUserRoute,
        ListUsersRoute,
        RegisterUserRoute,
        RemoveGameFromShelfRoute,
        UpdateUserRoute,
    },
};

fn configure_app(
    config: AuthConfig,
    user_db: MockShelfDb,
    game_db: MockShelfDb,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let issuer = TokenIssuer::new(&config);
        let verifier = issuer.verifier();
        cfg.app_data(web::Data::new(UserApi::new(user_db)))
            .app_data(web::Data::new(GameApi::new(game_db)))
            .app_data(web::Data::new(issuer))
            .service(
                web::scope("/api")
                    .wrap(JwtAuthenticationFactory::new(verifier))
                    .service(RegisterUserRoute::<MockShelfDb>::new())
                    .service(ListUsersRoute::<MockShelfDb>::new())
                    .service(AddGameToShelfRoute::<MockShelfDb>::new())
                    .service(RemoveGameFromShelfRoute::<MockShelfDb>::new())
                    .service(GetUserRoute::<MockShelfDb>::new())
                    .service(UpdateUserRoute::<MockShelfDb>::new())
                    .service(DeleteUserRoute::<MockShelfDb>::new()),
            );
    }
}

//----------------------------------------------   Registration  ----------------------------------------------------

#[actix_web::test]
async fn registration_creates_a_lowercased_non_admin_account() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    let created = seed_user(1, "exampleUser", false);
    let reply = created.clone();
    db.expect_create_user()
        // A submitted admin flag must not make it into the record.
        .withf(|user| user.username == "exampleuser" && !user.admin)
        .returning(move |_| Ok(reply.clone()));
    let app = test::init_service(
        App::new().configure(configure_app(AuthConfig::default(), db, MockShelfDb::new())),
    )
    .await;
    let req = TestRequest::post()
        .uri("/api/users")
        .set_json(json!({
            "username": "exampleUser",
            "password": "examplePass",
            "name": "Example User",
            "admin": true
        }))
        .to_request();
    let (status, headers, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 201, "was: {status} {body}");
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/api/users/1");
    let user: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(user["username"], "exampleuser");
    assert_eq!(user["admin"], false);
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());
}

#[actix_web::test]
async fn registration_validates_fields_before_touching_the_store() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_create_user().times(0);
    let app = test::init_service(
        App::new().configure(configure_app(AuthConfig::default(), db, MockShelfDb::new())),
    )
    .await;

    let cases = [
        (json!({ "password": "examplePass" }), "Missing field", "username"),
        (json!({ "username": "exampleUser" }), "Missing field", "password"),
        (json!({ "username": 1234, "password": "examplePass" }), "Incorrect field type: expected string", "username"),
        (
            json!({ "username": " exampleUser ", "password": "examplePass" }),
            "Cannot start or end with whitespace",
            "username",
        ),
        (json!({ "username": "", "password": "examplePass" }), "Must be at least 1 characters long", "username"),
        (json!({ "username": "exampleUser", "password": "1234567" }), "Must be at least 8 characters long", "password"),
        (
            json!({ "username": "exampleUser", "password": "a".repeat(73) }),
            "Must be at most 72 characters long",
            "password",
        ),
    ];
    for (payload, message, location) in cases {
        let req = TestRequest::post().uri("/api/users").set_json(payload.clone()).to_request();
        let (status, _, body) = send(&app, req).await;
        assert_eq!(status.as_u16(), 422, "payload: {payload}");
        let err: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(err["reason"], "ValidationError", "payload: {payload}");
        assert_eq!(err["message"], message, "payload: {payload}");
        assert_eq!(err["location"], location, "payload: {payload}");
    }
}

#[actix_web::test]
async fn duplicate_usernames_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_create_user().returning(|_| Err(shelf_engine::traits::UserApiError::UsernameTaken));
    let app = test::init_service(
        App::new().configure(configure_app(AuthConfig::default(), db, MockShelfDb::new())),
    )
    .await;
    let req = TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "username": "exampleUser", "password": "examplePass" }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 422);
    assert_eq!(body, r#"{"location":"username","message":"Username already taken","reason":"ValidationError"}"#);
}

//----------------------------------------------   Reads  ----------------------------------------------------

#[actix_web::test]
async fn listing_users_is_admin_only() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let admin = seed_user(9, "adminUser", true);
    let user = seed_user(1, "exampleUser", false);

    let mut db = MockShelfDb::new();
    let all = vec![admin.clone(), user.clone()];
    db.expect_fetch_all_users().returning(move || Ok(all.clone()));
    let app =
        test::init_service(App::new().configure(configure_app(config.clone(), db, MockShelfDb::new()))).await;

    // No token at all.
    let req = TestRequest::get().uri("/api/users").to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);

    // A regular account.
    let req = TestRequest::get()
        .uri("/api/users")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);

    // An admin.
    let req = TestRequest::get()
        .uri("/api/users")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&admin, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success());
    let users: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(users.as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn single_user_reads_are_public() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    let user = seed_user(1, "exampleUser", false);
    let reply = user.clone();
    db.expect_fetch_user().withf(|id| id.value() == 1).returning(move |_| Ok(Some(reply.clone())));
    let app = test::init_service(
        App::new().configure(configure_app(AuthConfig::default(), db, MockShelfDb::new())),
    )
    .await;
    // Note the asymmetry with the admin-only listing; this is deliberate.
    let req = TestRequest::get().uri("/api/users/1").to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success());
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["username"], "exampleuser");
    assert!(json.get("password").is_none());
}

#[actix_web::test]
async fn malformed_user_ids_are_rejected_before_any_lookup() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_fetch_user().times(0);
    let app = test::init_service(
        App::new().configure(configure_app(AuthConfig::default(), db, MockShelfDb::new())),
    )
    .await;
    let req = TestRequest::get().uri("/api/users/NOT-A-VALID-ID").to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 400);
    assert_eq!(body, r#"{"message":"The id is not valid"}"#);
}

#[actix_web::test]
async fn a_well_formed_but_unknown_user_id_is_a_404_with_an_empty_body() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_fetch_user().returning(|_| Ok(None));
    let app = test::init_service(
        App::new().configure(configure_app(AuthConfig::default(), db, MockShelfDb::new())),
    )
    .await;
    let req = TestRequest::get().uri("/api/users/999").to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 404);
    assert!(body.is_empty());
}

//----------------------------------------------   Updates  ----------------------------------------------------

#[actix_web::test]
async fn users_may_update_their_own_profile() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut updated = user.clone();
    updated.name = Some("New Name".to_string());

    let mut db = MockShelfDb::new();
    let reply = updated.clone();
    db.expect_update_user()
        .withf(|id, update| id.value() == 1 && update.name.as_deref() == Some("New Name") && update.admin.is_none())
        .returning(move |_, _| Ok(Some(reply.clone())));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db, MockShelfDb::new()))).await;
    let req = TestRequest::put()
        .uri("/api/users/1")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .set_json(json!({ "name": "New Name" }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success(), "was: {status} {body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["name"], "New Name");
}

#[actix_web::test]
async fn users_may_not_update_someone_else() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_update_user().times(0);
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db, MockShelfDb::new()))).await;
    let req = TestRequest::put()
        .uri("/api/users/2")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .set_json(json!({ "name": "New Name" }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}

#[actix_web::test]
async fn non_admins_may_not_touch_the_admin_flag_even_on_themselves() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_update_user().times(0);
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db, MockShelfDb::new()))).await;
    let req = TestRequest::put()
        .uri("/api/users/1")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .set_json(json!({ "admin": true }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}

#[actix_web::test]
async fn admins_may_promote_another_user() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let admin = seed_user(9, "adminUser", true);
    let mut promoted = seed_user(1, "exampleUser", false);
    promoted.admin = true;

    let mut db = MockShelfDb::new();
    let reply = promoted.clone();
    db.expect_update_user()
        .withf(|id, update| id.value() == 1 && update.admin == Some(true))
        .returning(move |_, _| Ok(Some(reply.clone())));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db, MockShelfDb::new()))).await;
    let req = TestRequest::put()
        .uri("/api/users/1")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&admin, &config))))
        .set_json(json!({ "admin": true }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success(), "was: {status} {body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["admin"], true);
}

//----------------------------------------------   Deletion  ----------------------------------------------------

#[actix_web::test]
async fn deleting_another_account_is_refused_even_for_admins() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let admin = seed_user(9, "adminUser", true);
    let mut db = MockShelfDb::new();
    db.expect_delete_user().times(0);
    db.expect_delete_games_submitted_by().times(0);
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db, MockShelfDb::new()))).await;
    let req = TestRequest::delete()
        .uri("/api/users/1")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&admin, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    // Deliberately a descriptive 400, not the uniform Unauthorized.
    assert_eq!(status.as_u16(), 400);
    assert_eq!(body, r#"{"message":"You may only delete your own account"}"#);
}

#[actix_web::test]
async fn deleting_your_own_account_cascades_to_your_games() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_delete_games_submitted_by().withf(|id| id.value() == 1).times(1).returning(|_| Ok(2));
    db.expect_delete_user().withf(|id| id.value() == 1).times(1).returning(|_| Ok(true));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db, MockShelfDb::new()))).await;
    let req = TestRequest::delete()
        .uri("/api/users/1")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 204, "was: {status} {body}");
    assert!(body.is_empty());
}

//----------------------------------------------   Shelves  ----------------------------------------------------

#[actix_web::test]
async fn users_shelve_catalog_games_for_themselves() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);

    let mut user_db = MockShelfDb::new();
    user_db
        .expect_add_game_to_shelf()
        .withf(|user_id, game_id| user_id.value() == 1 && game_id.value() == 5)
        .times(1)
        .returning(|_, _| Ok(()));
    let mut game_db = MockShelfDb::new();
    game_db
        .expect_fetch_game()
        .withf(|id, _| id.value() == 5)
        .returning(|_, _| Ok(Some(seed_game(5, "Tokaido", GameStatus::Approved))));

    let app = test::init_service(App::new().configure(configure_app(config.clone(), user_db, game_db))).await;
    let req = TestRequest::post()
        .uri("/api/users/1/games/5")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 204, "was: {status} {body}");
}

#[actix_web::test]
async fn shelving_an_unknown_game_is_a_404() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut user_db = MockShelfDb::new();
    user_db.expect_add_game_to_shelf().times(0);
    let mut game_db = MockShelfDb::new();
    game_db.expect_fetch_game().returning(|_, _| Ok(None));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), user_db, game_db))).await;
    let req = TestRequest::post()
        .uri("/api/users/1/games/999")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .to_request();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status.as_u16(), 404);
}

#[actix_web::test]
async fn you_cannot_edit_someone_elses_shelf() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut user_db = MockShelfDb::new();
    user_db.expect_remove_game_from_shelf().times(0);
    let app =
        test::init_service(App::new().configure(configure_app(config.clone(), user_db, MockShelfDb::new()))).await;
    let req = TestRequest::delete()
        .uri("/api/users/2/games/5")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}

#[actix_web::test]
async fn removing_a_shelved_game_removes_every_copy() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut user_db = MockShelfDb::new();
    user_db
        .expect_remove_game_from_shelf()
        .withf(|user_id, game_id| user_id == &UserId(1) && game_id.value() == 5)
        .times(1)
        .returning(|_, _| Ok(2));
    let app =
        test::init_service(App::new().configure(configure_app(config.clone(), user_db, MockShelfDb::new()))).await;
    let req = TestRequest::delete()
        .uri("/api/users/1/games/5")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .to_request();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status.as_u16(), 204);
}
