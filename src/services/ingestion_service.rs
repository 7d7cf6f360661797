//! Fetch -> normalize -> dedupe-insert for a batch of symbols.
//!
//! A provider failure skips only the affected symbol and a persistence
//! failure skips only the affected record; neither aborts the batch.

use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::db::{FinancialStore, InsertOutcome};
use crate::errors::AppError;
use crate::external::price_provider::{DailyEntry, PriceProvider};
use crate::models::{FinancialRecordView, NewFinancialRecord};
use crate::response::{Envelope, Info};
use crate::services::validation::parse_date;

/// Number of most recent daily entries taken from each upstream series.
pub const DEFAULT_WINDOW_DAYS: usize = 14;

/// What one symbol's ingestion produced. Whether each record was inserted or
/// already present is only logged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionReport {
    pub symbol: String,
    pub records: Vec<FinancialRecordView>,
    pub info: Info,
}

impl IngestionReport {
    fn ingested(symbol: String, records: Vec<FinancialRecordView>) -> Self {
        Self { symbol, records, info: Info::ok() }
    }

    fn skipped(symbol: String, error: impl Into<String>) -> Self {
        Self { symbol, records: Vec::new(), info: Info::error(error) }
    }

    pub fn is_success(&self) -> bool {
        self.info.error.is_empty()
    }

    /// A skipped symbol is reported as an info-only envelope.
    pub fn into_output(self) -> IngestionOutput {
        if self.is_success() {
            IngestionOutput::Report(self)
        } else {
            IngestionOutput::Failed(Envelope::info(self.info.error))
        }
    }
}

/// Printable form of an [`IngestionReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IngestionOutput {
    Report(IngestionReport),
    Failed(Envelope),
}

#[derive(Debug, Default)]
struct RecordTally {
    inserted: usize,
    existing: usize,
    failed: usize,
}

/// Ingest every symbol concurrently. One report per input symbol, in input order.
pub async fn ingest_symbols(
    store: &dyn FinancialStore,
    provider: &dyn PriceProvider,
    symbols: &[String],
    window: usize,
) -> Vec<IngestionReport> {
    join_all(
        symbols
            .iter()
            .map(|symbol| ingest_symbol(store, provider, symbol, window)),
    )
    .await
}

pub async fn ingest_symbol(
    store: &dyn FinancialStore,
    provider: &dyn PriceProvider,
    symbol: &str,
    window: usize,
) -> IngestionReport {
    let ticker = symbol.trim().to_uppercase();

    let series = match provider.fetch_daily_series(&ticker).await {
        Ok(series) => series,
        Err(e) => {
            error!("✗ Skipping {}: {:?}", ticker, e);
            return IngestionReport::skipped(ticker, e.to_string());
        }
    };

    if series.is_empty() {
        warn!("Provider returned no daily entries for {}", ticker);
        return IngestionReport::ingested(ticker, Vec::new());
    }

    let symbol_id = match ensure_symbol(store, &ticker).await {
        Ok(id) => id,
        Err(e) => {
            error!("✗ Could not register symbol {}: {:?}", ticker, e);
            return IngestionReport::skipped(ticker, e.public_message());
        }
    };

    let mut tally = RecordTally::default();
    let mut records = Vec::new();

    for entry in series.most_recent(window) {
        let record = match normalize(symbol_id, entry) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed entry {} for {}: {}", entry.date, ticker, e);
                tally.failed += 1;
                continue;
            }
        };

        match store.insert_record(&record).await {
            Ok(InsertOutcome::Inserted) => tally.inserted += 1,
            Ok(InsertOutcome::AlreadyExists) => tally.existing += 1,
            Err(e) => {
                error!("Failed to store {} {}: {}", ticker, record.date, e);
                tally.failed += 1;
            }
        }

        records.push(FinancialRecordView {
            symbol: ticker.clone(),
            date: record.date,
            open_price: record.open_price,
            close_price: record.close_price,
            volume: record.volume,
        });
    }

    info!(
        "✓ {}: {} inserted, {} already present, {} failed",
        ticker, tally.inserted, tally.existing, tally.failed
    );
    IngestionReport::ingested(ticker, records)
}

async fn ensure_symbol(store: &dyn FinancialStore, ticker: &str) -> Result<i32, AppError> {
    store.upsert_symbol(ticker).await?;
    store
        .find_symbol(ticker)
        .await?
        .map(|s| s.id)
        .ok_or_else(|| AppError::Internal(format!("symbol {} missing after insert", ticker)))
}

fn parse_amount(field: &str, raw: &str) -> Result<f64, AppError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(AppError::WrongType(format!("{}={}", field, raw))),
    }
}

fn normalize(symbol_id: i32, entry: &DailyEntry) -> Result<NewFinancialRecord, AppError> {
    let volume = match entry.bar.volume.trim().parse::<i64>() {
        Ok(v) if v >= 0 => v,
        _ => return Err(AppError::WrongType(format!("volume={}", entry.bar.volume))),
    };

    Ok(NewFinancialRecord {
        symbol_id,
        date: parse_date(&entry.date)?,
        open_price: parse_amount("open", &entry.bar.open)?,
        close_price: parse_amount("close", &entry.bar.close)?,
        volume,
    })
}
