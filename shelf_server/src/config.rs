use std::env;

use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use shelf_common::Secret;

use crate::errors::ServerError;

const DEFAULT_SHELF_HOST: &str = "127.0.0.1";
const DEFAULT_SHELF_PORT: u16 = 8080;
const DEFAULT_JWT_EXPIRY_DAYS: i64 = 7;
// The shelves index is rebuilt once a day unless configured otherwise.
const DEFAULT_SHELVES_REBUILD_SECS: u64 = 86_400;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// How often the background worker rebuilds the denormalized shelves index.
    pub shelves_rebuild_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SHELF_HOST.to_string(),
            port: DEFAULT_SHELF_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            shelves_rebuild_secs: DEFAULT_SHELVES_REBUILD_SECS,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SHELF_HOST").ok().unwrap_or_else(|| DEFAULT_SHELF_HOST.into());
        let port = env::var("SHELF_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SHELF_PORT. {e} Using the default, {DEFAULT_SHELF_PORT}, \
                         instead."
                    );
                    DEFAULT_SHELF_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SHELF_PORT);
        let database_url = env::var("SHELF_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SHELF_DATABASE_URL is not set. Please set it to the URL for the shelf database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to \
                 the default configuration."
            );
            AuthConfig::default()
        });
        let shelves_rebuild_secs = env::var("SHELF_SHELVES_REBUILD_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SHELF_SHELVES_REBUILD_SECS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_SHELVES_REBUILD_SECS);
        Self { host, port, database_url, auth, shelves_rebuild_secs }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long issued tokens stay valid.
    pub jwt_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this, since every token dies with the process. Set SHELF_JWT_SECRET instead. \
             🚨️🚨️🚨️"
        );
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret), jwt_expiry: Duration::days(DEFAULT_JWT_EXPIRY_DAYS) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("SHELF_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [SHELF_JWT_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "SHELF_JWT_SECRET must be at least 32 characters long.".to_string(),
            ));
        }
        let jwt_expiry = match env::var("SHELF_JWT_EXPIRY_DAYS") {
            Ok(s) => s
                .parse::<i64>()
                .map(Duration::days)
                .map_err(|e| ServerError::ConfigurationError(format!("Invalid SHELF_JWT_EXPIRY_DAYS: {e}")))?,
            Err(_) => {
                info!("🪛️ SHELF_JWT_EXPIRY_DAYS is not set. Using the default of {DEFAULT_JWT_EXPIRY_DAYS} days.");
                Duration::days(DEFAULT_JWT_EXPIRY_DAYS)
            },
        };
        Ok(Self { jwt_secret: Secret::new(secret), jwt_expiry })
    }
}
