//! Seed Symbol Ingestion Job
//!
//! Pulls the most recent daily series for every configured seed symbol and
//! stores it. Runs out of band from the HTTP path, on the scheduler's cron
//! expression (`INGESTION_CRON`, daily at 2:00 AM by default) and optionally
//! once at startup.
//!
//! # Error Handling
//!
//! - A provider failure skips only that symbol; the rest of the batch continues
//! - A storage failure skips only the affected record
//! - Re-running the job is safe: existing (symbol, date) pairs are left untouched

use crate::errors::AppError;
use crate::services::ingestion_service;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use tracing::{info, warn};

pub async fn ingest_seed_symbols(ctx: JobContext) -> Result<JobResult, AppError> {
    if ctx.symbols.is_empty() {
        warn!("No seed symbols configured, nothing to ingest");
        return Ok(JobResult {
            items_processed: 0,
            items_failed: 0,
        });
    }

    info!("Ingesting {} symbols: {}", ctx.symbols.len(), ctx.symbols.join(", "));

    let reports = ingestion_service::ingest_symbols(
        ctx.store.as_ref(),
        ctx.provider.as_ref(),
        &ctx.symbols,
        ctx.window_days,
    )
    .await;

    let mut result = JobResult {
        items_processed: 0,
        items_failed: 0,
    };
    for report in &reports {
        if report.is_success() {
            result.items_processed += 1;
        } else {
            warn!("Ingestion of {} skipped: {}", report.symbol, report.info.error);
            result.items_failed += 1;
        }
    }

    Ok(result)
}
