use crate::credentials::CredentialTable;
use std::env;

/// Default issuer and audience embedded in, and required of, every token.
pub const DEFAULT_JWT_ISSUER: &str = "UniversityAPI";

const LOCAL_JWT_SECRET: &str = "university-api-local-development-secret";

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and pulled into
/// handlers via `FromRef`, like every other part of the unified `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` is only accepted locally, where the seeded
    // in-memory store is used instead.
    pub db_url: Option<String>,
    // Runtime environment marker. Controls log format and fail-fast behavior.
    pub env: Env,
    // Symmetric HMAC-SHA256 key used to sign and verify bearer tokens.
    pub jwt_secret: String,
    // Issuer and audience of every token; both carry the service name.
    pub jwt_issuer: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // The fixed login table, read-only after startup.
    pub credentials: CredentialTable,
}

/// Env
///
/// The runtime context: `Local` allows development fallbacks, `Production` demands every
/// secret explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for test setup.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            jwt_issuer: DEFAULT_JWT_ISSUER.to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            credentials: CredentialTable::default(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables (after `.env` has been applied by
    /// the caller) and implements the **fail-fast** principle.
    ///
    /// # Panics
    /// Panics in `production` when `DATABASE_URL` or `JWT_SECRET` is missing, so the service
    /// never starts with an unsigned-token fallback or without its store.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()).as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production")),
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
            ),
            Env::Local => (
                env::var("DATABASE_URL").ok(),
                env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
            ),
        };

        Self {
            db_url,
            env,
            jwt_secret,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_JWT_ISSUER.to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            credentials: CredentialTable::default(),
        }
    }
}
