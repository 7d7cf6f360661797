//! Run the seed-symbol ingestion once and print the per-symbol reports.
//! Skipped symbols are printed as `{"info": {"error": ...}}`.
//!
//! Usage: `ingest [SYMBOL ...]`. Without arguments the configured
//! `SEED_SYMBOLS` are used.

use anyhow::Context;
use findata_backend::config::AppConfig;
use findata_backend::db::PgFinancialStore;
use findata_backend::external::alphavantage::AlphaVantageProvider;
use findata_backend::external::throttle::RequestThrottle;
use findata_backend::logging::{init_logging, LoggingConfig};
use findata_backend::services::ingestion_service;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging(LoggingConfig::from_env("findata-ingest"))
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize logging")?;

    let config = AppConfig::from_env().context("invalid configuration")?;

    let args: Vec<String> = std::env::args()
        .skip(1)
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    let symbols = if args.is_empty() { config.seed_symbols.clone() } else { args };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    let store = PgFinancialStore::new(pool);
    sqlx::migrate!("./migrations")
        .run(store.pool())
        .await
        .context("failed to run migrations")?;

    let provider = AlphaVantageProvider::new(
        &config.provider_base_url,
        &config.api_key,
        config.provider_timeout,
        RequestThrottle::new(2, config.provider_requests_per_minute),
    )?;

    let reports =
        ingestion_service::ingest_symbols(&store, &provider, &symbols, config.ingest_window_days).await;

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    let outputs: Vec<_> = reports.into_iter().map(|r| r.into_output()).collect();
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    if failed > 0 {
        tracing::warn!("{} symbol(s) skipped", failed);
    }
    Ok(())
}
