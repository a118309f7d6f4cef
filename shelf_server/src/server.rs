use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use shelf_engine::{AuthApi, GameApi, SqliteDatabase, TagApi, UserApi};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    middleware::JwtAuthenticationFactory,
    routes::{
        health,
        AddGameToShelfRoute,
        AdminListGamesRoute,
        CreateGameRoute,
        CreateTagRoute,
        DeleteGameRoute,
        DeleteTagRoute,
        DeleteUserRoute,
        GetGameRoute,
        GetTagRoute,
        GetUserRoute,
        HardRefreshRoute,
        ListGamesRoute,
        ListTagsRoute,
        ListUsersRoute,
        LoginRoute,
        RefreshRoute,
        RegisterUserRoute,
        RemoveGameFromShelfRoute,
        UpdateGameRoute,
        UpdateTagRoute,
        UpdateUserRoute,
    },
    shelves_worker::start_shelves_worker,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let _worker = start_shelves_worker(db.clone(), Duration::from_secs(config.shelves_rebuild_secs));
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let auth_api = AuthApi::new(db.clone());
        let user_api = UserApi::new(db.clone());
        let game_api = GameApi::new(db.clone());
        let tag_api = TagApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let verifier = jwt_signer.verifier();
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("shelf::access_log"))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(user_api))
            .app_data(web::Data::new(game_api))
            .app_data(web::Data::new(tag_api))
            .app_data(web::Data::new(jwt_signer));
        // Everything lives under /api behind the JWT middleware. Public routes simply don't
        // require claims; routes wrapped with an ACL do.
        let api_scope = web::scope("/api")
            .wrap(JwtAuthenticationFactory::new(verifier))
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(RefreshRoute::new())
            .service(HardRefreshRoute::<SqliteDatabase>::new())
            .service(RegisterUserRoute::<SqliteDatabase>::new())
            .service(ListUsersRoute::<SqliteDatabase>::new())
            .service(AddGameToShelfRoute::<SqliteDatabase>::new())
            .service(RemoveGameFromShelfRoute::<SqliteDatabase>::new())
            .service(GetUserRoute::<SqliteDatabase>::new())
            .service(UpdateUserRoute::<SqliteDatabase>::new())
            .service(DeleteUserRoute::<SqliteDatabase>::new())
            .service(AdminListGamesRoute::<SqliteDatabase>::new())
            .service(ListGamesRoute::<SqliteDatabase>::new())
            .service(CreateGameRoute::<SqliteDatabase>::new())
            .service(GetGameRoute::<SqliteDatabase>::new())
            .service(UpdateGameRoute::<SqliteDatabase>::new())
            .service(DeleteGameRoute::<SqliteDatabase>::new())
            .service(ListTagsRoute::<SqliteDatabase>::new())
            .service(CreateTagRoute::<SqliteDatabase>::new())
            .service(GetTagRoute::<SqliteDatabase>::new())
            .service(UpdateTagRoute::<SqliteDatabase>::new())
            .service(DeleteTagRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
