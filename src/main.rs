use std::sync::Arc;

use anyhow::Context;
use findata_backend::app;
use findata_backend::config::AppConfig;
use findata_backend::db::{FinancialStore, PgFinancialStore};
use findata_backend::external::alphavantage::AlphaVantageProvider;
use findata_backend::external::price_provider::PriceProvider;
use findata_backend::external::throttle::RequestThrottle;
use findata_backend::logging::{init_logging, LoggingConfig};
use findata_backend::services::job_scheduler_service::{JobContext, JobSchedulerService};
use findata_backend::state::AppState;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env("findata"))
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize logging")?;

    let config = AppConfig::from_env().context("invalid configuration")?;

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
    let store: Arc<dyn FinancialStore> = Arc::new(store);

    let provider: Arc<dyn PriceProvider> = Arc::new(AlphaVantageProvider::new(
        &config.provider_base_url,
        &config.api_key,
        config.provider_timeout,
        RequestThrottle::new(2, config.provider_requests_per_minute),
    )?);
    if config.api_key == "demo" {
        tracing::warn!("ALPHAVANTAGE_API_KEY not set, using the demo key");
    }

    let mut scheduler = JobSchedulerService::new(JobContext {
        store: store.clone(),
        provider,
        symbols: Arc::new(config.seed_symbols.clone()),
        window_days: config.ingest_window_days,
    })
    .await?;
    scheduler.start(&config.ingestion_cron).await?;
    if config.ingest_on_startup {
        scheduler.trigger_ingestion();
    }

    let app = app::create_app(AppState { store });

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚀 Financial data backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
