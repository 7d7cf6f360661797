use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::external::alphavantage::DEFAULT_BASE_URL;
use crate::services::ingestion_service::DEFAULT_WINDOW_DAYS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub api_key: String,
    pub provider_base_url: String,
    pub provider_timeout: Duration,
    pub provider_requests_per_minute: u32,
    pub seed_symbols: Vec<String>,
    pub ingest_window_days: usize,
    pub ingestion_cron: String,
    pub ingest_on_startup: bool,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = match get("DATABASE_URL") {
            Some(url) => url,
            None => database_url_from_parts(&get)?,
        };

        let api_key = get("ALPHAVANTAGE_API_KEY")
            .or_else(|| get("RAW_API_KEY"))
            .unwrap_or_else(|| "demo".to_string());

        let seed_symbols = get("SEED_SYMBOLS")
            .unwrap_or_else(|| "AAPL,IBM".to_string())
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 10)?,
            api_key,
            provider_base_url: get("ALPHAVANTAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            provider_timeout: Duration::from_secs(parse_or(
                "PROVIDER_TIMEOUT_SECS",
                get("PROVIDER_TIMEOUT_SECS"),
                30,
            )?),
            provider_requests_per_minute: parse_or(
                "PROVIDER_REQUESTS_PER_MINUTE",
                get("PROVIDER_REQUESTS_PER_MINUTE"),
                5,
            )?,
            seed_symbols,
            ingest_window_days: parse_or(
                "INGEST_WINDOW_DAYS",
                get("INGEST_WINDOW_DAYS"),
                DEFAULT_WINDOW_DAYS,
            )?,
            ingestion_cron: get("INGESTION_CRON").unwrap_or_else(|| "0 0 2 * * *".to_string()),
            ingest_on_startup: parse_or("INGEST_ON_STARTUP", get("INGEST_ON_STARTUP"), false)?,
            bind_addr: parse_or(
                "BIND_ADDR",
                get("BIND_ADDR"),
                SocketAddr::from(([0, 0, 0, 0], 3000)),
            )?,
        })
    }
}

fn database_url_from_parts<G>(get: &G) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let user = get("DB_USER").ok_or(ConfigError::Missing("DATABASE_URL or DB_USER"))?;
    let pass = get("DB_PASS").unwrap_or_default();
    let host = get("DB_HOST").unwrap_or_else(|| "localhost".to_string());
    let port = get("DB_PORT").unwrap_or_else(|| "5432".to_string());
    let db = get("DB").ok_or(ConfigError::Missing("DB"))?;

    Ok(format!("postgres://{}:{}@{}:{}/{}", user, pass, host, port, db))
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
