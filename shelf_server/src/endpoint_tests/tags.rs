use actix_web::{http::header, test, test::TestRequest, web, web::ServiceConfig, App};
use serde_json::json;
use shelf_engine::{db_types::TagCategory, TagApi};

use super::{helpers::*, mocks::MockShelfDb};
use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    middleware::JwtAuthenticationFactory,
    routes::{CreateTagRoute, DeleteTagRoute, GetTagRoute, ListTagsRoute, UpdateTagRoute},
};

fn configure_app(config: AuthConfig, tag_db: MockShelfDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let issuer = TokenIssuer::new(&config);
        let verifier = issuer.verifier();
        cfg.app_data(web::Data::new(TagApi::new(tag_db))).app_data(web::Data::new(issuer)).service(
            web::scope("/api")
                .wrap(JwtAuthenticationFactory::new(verifier))
                .service(ListTagsRoute::<MockShelfDb>::new())
                .service(CreateTagRoute::<MockShelfDb>::new())
                .service(GetTagRoute::<MockShelfDb>::new())
                .service(UpdateTagRoute::<MockShelfDb>::new())
                .service(DeleteTagRoute::<MockShelfDb>::new()),
        );
    }
}

#[actix_web::test]
async fn the_tag_vocabulary_is_publicly_readable() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_fetch_all_tags()
        .returning(|| Ok(vec![seed_tag(1, "cards"), seed_tag(2, "deck-building"), seed_tag(3, "dice")]));
    let app = test::init_service(App::new().configure(configure_app(AuthConfig::default(), db))).await;
    let req = TestRequest::get().uri("/api/tags").to_request();
    let (status, _, body) = send(&app, req).await;
    assert!(status.is_success());
    let tags: serde_json::Value = serde_json::from_str(&body).unwrap();
    let names: Vec<&str> = tags.as_array().unwrap().iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["cards", "deck-building", "dice"]);
}

#[actix_web::test]
async fn single_tag_reads_validate_the_id_first() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_fetch_tag().times(0);
    let app = test::init_service(App::new().configure(configure_app(AuthConfig::default(), db))).await;
    let req = TestRequest::get().uri("/api/tags/NOT-A-VALID-ID").to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 400);
    assert_eq!(body, r#"{"message":"The id is not valid"}"#);
}

#[actix_web::test]
async fn creating_tags_requires_authentication() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShelfDb::new();
    db.expect_insert_tag().times(0);
    let app = test::init_service(App::new().configure(configure_app(AuthConfig::default(), db))).await;
    let req = TestRequest::post().uri("/api/tags").set_json(json!({ "name": "dice" })).to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, r#"{"message":"Unauthorized"}"#);
}

#[actix_web::test]
async fn authenticated_users_create_tags_with_a_location_header() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    let mut created = seed_tag(4, "kid-friendly");
    created.category = Some(TagCategory::Themes);
    let reply = created.clone();
    db.expect_insert_tag()
        .withf(|tag| tag.name == "kid-friendly" && tag.category == Some(TagCategory::Themes))
        .returning(move |_| Ok(reply.clone()));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::post()
        .uri("/api/tags")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .set_json(json!({ "name": "kid-friendly", "category": "Themes" }))
        .to_request();
    let (status, headers, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 201, "was: {status} {body}");
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/api/tags/4");
    let tag: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(tag["name"], "kid-friendly");
    assert_eq!(tag["category"], "Themes");
}

#[actix_web::test]
async fn tags_require_a_name() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_insert_tag().times(0);
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::post()
        .uri("/api/tags")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .set_json(json!({}))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 400);
    assert_eq!(body, r#"{"message":"Missing name in request body"}"#);
}

#[actix_web::test]
async fn an_unknown_category_is_rejected_not_coerced() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_insert_tag().times(0);
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::post()
        .uri("/api/tags")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .set_json(json!({ "name": "weird", "category": "Vibes" }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 400);
    assert_eq!(body, r#"{"message":"That is not a valid category"}"#);
}

#[actix_web::test]
async fn duplicate_tag_names_are_rejected() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_insert_tag().returning(|_| Err(shelf_engine::traits::TagApiError::DuplicateTagName));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::post()
        .uri("/api/tags")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .set_json(json!({ "name": "dice" }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 400);
    assert_eq!(body, r#"{"message":"Tag name already exists"}"#);
}

#[actix_web::test]
async fn updating_a_missing_tag_is_a_404() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    db.expect_update_tag().returning(|_, _| Ok(None));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::put()
        .uri("/api/tags/999")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .set_json(json!({ "name": "renamed" }))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 404);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn deleting_a_tag_detaches_it_from_every_game() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::default();
    let user = seed_user(1, "exampleUser", false);
    let mut db = MockShelfDb::new();
    // Both halves of the cascade run: the tag row and its references on games.
    db.expect_detach_tag_from_games().withf(|id| id.value() == 3).times(1).returning(|_| Ok(2));
    db.expect_delete_tag().withf(|id| id.value() == 3).times(1).returning(|_| Ok(true));
    let app = test::init_service(App::new().configure(configure_app(config.clone(), db))).await;
    let req = TestRequest::delete()
        .uri("/api/tags/3")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_for(&user, &config))))
        .to_request();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status.as_u16(), 204, "was: {status} {body}");
    assert!(body.is_empty());
}
