use std::env;

pub const DEFAULT_PORT: u16 = 3003;
const LOCAL_SECRET: &str = "bloglist-local-development-secret";

/// AppConfig
///
/// The configuration loaded once at startup and shared read-only through
/// `AppState`. The token secret and the database URL are handed from here to the
/// constructors that need them; nothing reads the environment after `load()`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` (local only) selects the in-memory repository.
    pub db_url: Option<String>,
    pub env: Env,
    // Secret used to sign and verify login tokens.
    pub secret: String,
    pub port: u16,
    // Argon2 time cost for password hashing.
    pub hash_cost: u32,
}

/// Env
///
/// Runtime context: `Local` allows fallbacks for the database and secret and
/// logs in a human-readable format; `Production` requires both and logs JSON.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for tests: local mode, in-memory storage.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            secret: LOCAL_SECRET.to_string(),
            port: DEFAULT_PORT,
            hash_cost: argon2::Params::DEFAULT_T_COST,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads `APP_ENV`, `DATABASE_URL`, `SECRET`, `PORT` and `PASSWORD_HASH_COST`.
    ///
    /// # Panics
    /// In production, panics if `DATABASE_URL` or `SECRET` is missing. In any mode,
    /// panics if `PORT` or `PASSWORD_HASH_COST` is set but not a number.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let (db_url, secret) = match env {
            Env::Production => (
                Some(env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production")),
                env::var("SECRET").expect("FATAL: SECRET must be set in production."),
            ),
            Env::Local => (
                env::var("DATABASE_URL").ok(),
                env::var("SECRET").unwrap_or_else(|_| LOCAL_SECRET.to_string()),
            ),
        };

        let port = env::var("PORT")
            .ok()
            .map(|p| p.parse().expect("FATAL: PORT must be a valid port number"))
            .unwrap_or(DEFAULT_PORT);

        let hash_cost = env::var("PASSWORD_HASH_COST")
            .ok()
            .map(|c| c.parse().expect("FATAL: PASSWORD_HASH_COST must be a positive integer"))
            .unwrap_or(argon2::Params::DEFAULT_T_COST);

        Self {
            db_url,
            env,
            secret,
            port,
            hash_cost,
        }
    }
}
