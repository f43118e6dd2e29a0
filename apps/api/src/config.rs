use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// When true, all requests run as a fixed demo identity (no auth proxy needed).
    pub use_dummy_auth: bool,
    /// Seconds between enrichment scan cycles.
    pub enrichment_interval_secs: u64,
    /// Maximum AI-call attempts per game per cycle.
    pub enrichment_max_attempts: u32,
    /// Seconds to wait between failed AI-call attempts.
    pub enrichment_retry_delay_secs: u64,
    /// Seconds to wait for the enrichment worker to stop at shutdown.
    pub shutdown_grace_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            use_dummy_auth: parse_env("USE_DUMMY_AUTH", true)?,
            enrichment_interval_secs: parse_env("ENRICHMENT_INTERVAL_SECS", 300)?,
            enrichment_max_attempts: parse_env("ENRICHMENT_MAX_ATTEMPTS", 3)?,
            enrichment_retry_delay_secs: parse_env("ENRICHMENT_RETRY_DELAY_SECS", 30)?,
            shutdown_grace_secs: parse_env("SHUTDOWN_GRACE_SECS", 10)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value")),
        Err(_) => Ok(default),
    }
}
