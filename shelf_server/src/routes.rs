//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Every handler follows the same order: parse the path id (a structurally invalid id is
//! rejected before anything else happens), consult the policy, validate the body fields,
//! then execute against the store. The first failed check short-circuits the rest.

use std::str::FromStr;

use actix_web::{get, http::header, web, HttpResponse, Responder};
use log::*;
use serde_json::Value;
use shelf_engine::{
    access::{authorize, game_scope, Action, GameScope},
    db_types::{GameId, InvalidIdError, Principal, TagId, UserId},
    traits::{GameManagement, TagManagement, UserManagement},
    AuthApi,
    GameApi,
    TagApi,
    UserApi,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    dto::{GameQueryParams, LoginRequest, TokenResponse},
    errors::ServerError,
    middleware::AccessLevel,
    validators,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$level:expr]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new($level));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$level:expr])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new($level));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Path segments are parsed before authorization or any store call; a malformed id never
/// gets further than this.
fn parse_id<T>(s: &str) -> Result<T, ServerError>
where T: FromStr<Err = InvalidIdError> {
    Ok(s.parse::<T>()?)
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(login => Post "/login" impl UserManagement);
/// Route handler for the login endpoint
///
/// Verifies a username/password pair and, if they check out, returns a fresh access token in
/// `{ "authToken": ... }`. The username is matched case-insensitively (accounts are stored
/// lowercased). A missing body field, an unknown username and a wrong password all produce
/// the same 401 response; nothing distinguishes the three, and nothing is mutated on the way
/// out.
pub async fn login<B: UserManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received login request");
    let LoginRequest { username, password } = body.into_inner();
    let (username, password) = match (username, password) {
        (Some(u), Some(p)) => (u, p),
        _ => {
            debug!("💻️ Login request was missing credentials");
            return Err(ServerError::Unauthorized);
        },
    };
    let user = api.authenticate(&username, &password).await?;
    let auth_token = signer.issue_token(Principal::from(&user), None)?;
    debug!("💻️ Issued access token for {}", user.username);
    Ok(HttpResponse::Ok().json(TokenResponse { auth_token }))
}

route!(refresh => Post "/refresh" requires [AccessLevel::User]);
/// Cheap token refresh: re-signs the principal snapshot already embedded in the presented
/// token with a fresh expiry. No store lookup, so the snapshot may be stale; use
/// `/hard-refresh` to bound the staleness.
pub async fn refresh(claims: JwtClaims, signer: web::Data<TokenIssuer>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST refresh for {}", claims.user.username);
    let auth_token = signer.issue_token(claims.user, None)?;
    Ok(HttpResponse::Ok().json(TokenResponse { auth_token }))
}

route!(hard_refresh => Post "/hard-refresh" impl UserManagement where requires [AccessLevel::User]);
/// Token refresh that re-reads the account from the store and issues a token from current
/// data. Costs a lookup; fixes staleness. If the account is gone, the caller is simply
/// unauthorized.
pub async fn hard_refresh<A: UserManagement>(
    claims: JwtClaims,
    api: web::Data<UserApi<A>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST hard-refresh for {}", claims.user.username);
    let user = api.fetch_user(claims.user.id).await?.ok_or(ServerError::Unauthorized)?;
    let auth_token = signer.issue_token(Principal::from(&user), None)?;
    Ok(HttpResponse::Ok().json(TokenResponse { auth_token }))
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(register_user => Post "/users" impl UserManagement);
/// Self-service registration. Open to the world, and always produces a regular account: an
/// `admin` field in the body is ignored. The created representation (sans password hash)
/// comes back under a Location header.
pub async fn register_user<B: UserManagement>(
    body: web::Json<Value>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received registration request");
    let (username, password, name, email) = validators::validate_registration(&body)?;
    let user = api.register(&username, &password, name, email).await?;
    let location = format!("/api/users/{}", user.id);
    Ok(HttpResponse::Created().insert_header((header::LOCATION, location)).json(user))
}

route!(list_users => Get "/users" impl UserManagement where requires [AccessLevel::Admin]);
/// Admin-only user listing, ordered by username.
pub async fn list_users<A: UserManagement>(
    claims: JwtClaims,
    api: web::Data<UserApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET users for {}", claims.user.username);
    let users = api.list_users(&claims.user).await?;
    Ok(HttpResponse::Ok().json(users))
}

route!(get_user => Get "/users/{id}" impl UserManagement);
/// Single-user read. Open to any caller, unlike the listing; the asymmetry is intentional
/// and preserved.
pub async fn get_user<B: UserManagement>(
    path: web::Path<String>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id: UserId = parse_id(&path.into_inner())?;
    debug!("💻️ GET user {id}");
    let user = api.fetch_user(id).await?.ok_or(ServerError::NotFound)?;
    Ok(HttpResponse::Ok().json(user))
}

route!(update_user => Put "/users/{id}" impl UserManagement where requires [AccessLevel::User]);
/// Profile update. The acting principal must be the target, except for the `admin` flag,
/// which only an admin may set (on anyone, including themselves). Non-admins cannot touch it
/// at all.
pub async fn update_user<A: UserManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<Value>,
    api: web::Data<UserApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id: UserId = parse_id(&path.into_inner())?;
    debug!("💻️ PUT user {id} by {}", claims.user.username);
    let (update, password) = validators::validate_user_update(&body)?;
    let user = api.update_user(&claims.user, id, update, password.as_deref()).await?.ok_or(ServerError::NotFound)?;
    Ok(HttpResponse::Ok().json(user))
}

route!(delete_user => Delete "/users/{id}" impl UserManagement, GameManagement where requires [AccessLevel::User]);
/// Account deletion. Strictly self-service: not even an admin may delete another account,
/// and trying gets the descriptive ownership error rather than the uniform 401. Deletes the
/// account and cascades to the games the user submitted.
pub async fn delete_user<A: UserManagement + GameManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<UserApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id: UserId = parse_id(&path.into_inner())?;
    info!("💻️ DELETE user {id} requested by {}", claims.user.username);
    api.delete_user(&claims.user, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

//----------------------------------------------   Shelves  ----------------------------------------------------
route!(add_game_to_shelf => Post "/users/{id}/games/{game_id}" impl UserManagement, GameManagement where requires [AccessLevel::User]);
/// Adds a catalog game to the caller's own shelf. The game must exist; duplicates are
/// allowed (and discouraged), and insertion order is what the shelf later reads back in.
pub async fn add_game_to_shelf<A: UserManagement + GameManagement>(
    claims: JwtClaims,
    path: web::Path<(String, String)>,
    user_api: web::Data<UserApi<A>>,
    game_api: web::Data<GameApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let (user_id, game_id) = path.into_inner();
    let user_id: UserId = parse_id(&user_id)?;
    let game_id: GameId = parse_id(&game_id)?;
    debug!("💻️ POST shelf game {game_id} for user {user_id}");
    // Policy first, then the referential check, then the write.
    authorize(Some(&claims.user), &Action::EditShelf { target: user_id })?;
    game_api.fetch_game(game_id, GameScope::All).await?.ok_or(ServerError::NotFound)?;
    user_api.add_game_to_shelf(&claims.user, user_id, game_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

route!(remove_game_from_shelf => Delete "/users/{id}/games/{game_id}" impl UserManagement where requires [AccessLevel::User]);
/// Removes every copy of a game from the caller's own shelf.
pub async fn remove_game_from_shelf<A: UserManagement>(
    claims: JwtClaims,
    path: web::Path<(String, String)>,
    api: web::Data<UserApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let (user_id, game_id) = path.into_inner();
    let user_id: UserId = parse_id(&user_id)?;
    let game_id: GameId = parse_id(&game_id)?;
    debug!("💻️ DELETE shelf game {game_id} for user {user_id}");
    api.remove_game_from_shelf(&claims.user, user_id, game_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

//----------------------------------------------   Games  ----------------------------------------------------
route!(list_games => Get "/games" impl GameManagement);
/// Public catalog listing. Only approved games are visible here, whatever narrowing filters
/// are supplied; the moderation clause is ANDed in unconditionally. Sorted ascending by
/// title.
pub async fn list_games<B: GameManagement>(
    query: web::Query<GameQueryParams>,
    api: web::Data<GameApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner().into_filter()?;
    debug!("💻️ GET games [{filter}]");
    let games = api.search_games(game_scope(None), filter).await?;
    Ok(HttpResponse::Ok().json(games))
}

route!(get_game => Get "/games/{id}" impl GameManagement);
/// Public catalog detail. Pending and rejected games are invisible on this path; asking for
/// one is indistinguishable from asking for a game that does not exist.
pub async fn get_game<B: GameManagement>(
    path: web::Path<String>,
    api: web::Data<GameApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id: GameId = parse_id(&path.into_inner())?;
    debug!("💻️ GET game {id}");
    let game = api.fetch_game(id, game_scope(None)).await?.ok_or(ServerError::NotFound)?;
    Ok(HttpResponse::Ok().json(game))
}

route!(create_game => Post "/games" impl GameManagement, UserManagement where requires [AccessLevel::User]);
/// Catalog submission. Any authenticated user may submit; the new game starts out pending
/// and lands on the submitter's shelf. Neither the status nor the ownership link can be
/// supplied by the client.
pub async fn create_game<A: GameManagement + UserManagement>(
    claims: JwtClaims,
    body: web::Json<Value>,
    api: web::Data<GameApi<A>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received game submission");
    let new_game = validators::validate_new_game(&body)?;
    let game = api.create_game(&claims.user, new_game).await?;
    let location = format!("/api/games/{}", game.id);
    Ok(HttpResponse::Created().insert_header((header::LOCATION, location)).json(game))
}

route!(update_game => Put "/games/{id}" impl GameManagement where requires [AccessLevel::Admin]);
/// Admin game update, including the moderation transition. The status value is validated
/// before any mutation; each of the three states is reachable from the others, and only
/// through this route.
pub async fn update_game<A: GameManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<Value>,
    api: web::Data<GameApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id: GameId = parse_id(&path.into_inner())?;
    debug!("💻️ PUT game {id} by {}", claims.user.username);
    let update = validators::validate_game_update(&body)?;
    let game = api.update_game(&claims.user, id, update).await?.ok_or(ServerError::NotFound)?;
    Ok(HttpResponse::Ok().json(game))
}

route!(delete_game => Delete "/games/{id}" impl GameManagement where requires [AccessLevel::Admin]);
/// Admin catalog delete. Removes the game and pulls it from every shelf holding it.
pub async fn delete_game<A: GameManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<GameApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id: GameId = parse_id(&path.into_inner())?;
    info!("💻️ DELETE game {id} requested by {}", claims.user.username);
    api.delete_game(&claims.user, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

route!(admin_list_games => Get "/admin/games" impl GameManagement where requires [AccessLevel::Admin]);
/// The moderation queue: the same listing and filters as the public catalog, but exempt from
/// the approved-only clause, so pending and rejected games show up too.
pub async fn admin_list_games<A: GameManagement>(
    claims: JwtClaims,
    query: web::Query<GameQueryParams>,
    api: web::Data<GameApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner().into_filter()?;
    debug!("💻️ GET admin games [{filter}] for {}", claims.user.username);
    let games = api.search_games(game_scope(Some(&claims.user)), filter).await?;
    Ok(HttpResponse::Ok().json(games))
}

//----------------------------------------------   Tags  ----------------------------------------------------
route!(list_tags => Get "/tags" impl TagManagement);
/// The shared tag vocabulary, ordered by name. Open to the world.
pub async fn list_tags<B: TagManagement>(api: web::Data<TagApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET tags");
    let tags = api.fetch_all_tags().await?;
    Ok(HttpResponse::Ok().json(tags))
}

route!(get_tag => Get "/tags/{id}" impl TagManagement);
pub async fn get_tag<B: TagManagement>(
    path: web::Path<String>,
    api: web::Data<TagApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id: TagId = parse_id(&path.into_inner())?;
    debug!("💻️ GET tag {id}");
    let tag = api.fetch_tag(id).await?.ok_or(ServerError::NotFound)?;
    Ok(HttpResponse::Ok().json(tag))
}

route!(create_tag => Post "/tags" impl TagManagement where requires [AccessLevel::User]);
/// Creates a tag in the shared vocabulary. Names are globally unique; the optional category
/// must be one of the fixed values.
pub async fn create_tag<A: TagManagement>(
    claims: JwtClaims,
    body: web::Json<Value>,
    api: web::Data<TagApi<A>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received new tag request");
    let name = validators::required_name(&body)?;
    let category = validators::optional_category(&body)?;
    let tag = api.create_tag(&claims.user, shelf_engine::db_types::NewTag { name, category }).await?;
    let location = format!("/api/tags/{}", tag.id);
    Ok(HttpResponse::Created().insert_header((header::LOCATION, location)).json(tag))
}

route!(update_tag => Put "/tags/{id}" impl TagManagement where requires [AccessLevel::User]);
pub async fn update_tag<A: TagManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<Value>,
    api: web::Data<TagApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id: TagId = parse_id(&path.into_inner())?;
    debug!("💻️ PUT tag {id} by {}", claims.user.username);
    let name = validators::required_name(&body)?;
    let category = validators::optional_category(&body)?;
    let tag = api
        .update_tag(&claims.user, id, shelf_engine::db_types::TagUpdate { name, category })
        .await?
        .ok_or(ServerError::NotFound)?;
    Ok(HttpResponse::Ok().json(tag))
}

route!(delete_tag => Delete "/tags/{id}" impl TagManagement where requires [AccessLevel::User]);
/// Deletes a tag and strips it from every game carrying it, leaving the games' other tags
/// intact.
pub async fn delete_tag<A: TagManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<TagApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id: TagId = parse_id(&path.into_inner())?;
    info!("💻️ DELETE tag {id} requested by {}", claims.user.username);
    api.delete_tag(&claims.user, id).await?;
    Ok(HttpResponse::NoContent().finish())
}
