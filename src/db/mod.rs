//! Persistence layer.
//!
//! All reads and writes of symbols and daily records go through the
//! [`FinancialStore`] trait. The storage-level UNIQUE constraints are the
//! authoritative dedup mechanism; existence checks are only a fast path.

pub mod pg_store;

#[cfg(test)]
pub mod memory_store;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{FinancialRecord, NewFinancialRecord, Symbol};

pub use pg_store::PgFinancialStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// A slice of records plus the number of records matching the filter before slicing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPage {
    pub records: Vec<FinancialRecord>,
    pub total: i64,
}

#[async_trait]
pub trait FinancialStore: Send + Sync {
    /// Insert the ticker if it is new. An existing ticker is not an error.
    async fn upsert_symbol(&self, ticker: &str) -> Result<(), StoreError>;

    async fn find_symbol(&self, ticker: &str) -> Result<Option<Symbol>, StoreError>;

    async fn record_exists(
        &self,
        symbol_id: i32,
        date: NaiveDate,
    ) -> Result<Option<FinancialRecord>, StoreError>;

    /// Insert a record unless one already exists for (symbol_id, date).
    async fn insert_record(&self, record: &NewFinancialRecord) -> Result<InsertOutcome, StoreError>;

    /// Records for the symbol over its whole history.
    async fn count_records(&self, symbol_id: i32) -> Result<i64, StoreError>;

    /// Records with `date` in `[start, end]`, in primary-key order, sliced.
    async fn query_range(
        &self,
        symbol_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<RecordPage, StoreError>;

    async fn query_all(
        &self,
        symbol_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FinancialRecord>, StoreError>;
}
