use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::db::{FinancialStore, InsertOutcome, RecordPage, StoreError};
use crate::models::{FinancialRecord, NewFinancialRecord, Symbol};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgFinancialStore {
    pool: PgPool,
}

impl PgFinancialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert one record in its own transaction. A unique violation from a
    /// concurrent writer is reported as `AlreadyExists`.
    async fn insert_in_transaction(&self, record: &NewFinancialRecord) -> Result<InsertOutcome, StoreError> {
        // The transaction rolls back when dropped, so every early return releases it.
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin transaction for symbol {}: {}", record.symbol_id, e);
            e
        })?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO financial_data (symbol_id, date, open_price, close_price, volume)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.symbol_id)
        .bind(record.date)
        .bind(record.open_price)
        .bind(record.close_price)
        .bind(record.volume)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {
                tx.commit().await.map_err(|e| {
                    error!("Failed to commit record for symbol {} on {}: {}", record.symbol_id, record.date, e);
                    e
                })?;
                info!("Record for symbol {} on {} added", record.symbol_id, record.date);
                Ok(InsertOutcome::Inserted)
            }
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                warn!("Record for symbol {} on {} inserted concurrently, skipping", record.symbol_id, record.date);
                Ok(InsertOutcome::AlreadyExists)
            }
            Err(e) => {
                error!("Failed to insert record for symbol {} on {}: {}", record.symbol_id, record.date, e);
                tx.rollback().await?;
                Err(e.into())
            }
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl FinancialStore for PgFinancialStore {
    async fn upsert_symbol(&self, ticker: &str) -> Result<(), StoreError> {
        let result = sqlx::query("INSERT INTO symbols (symbol) VALUES ($1)")
            .bind(ticker)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                info!("Symbol {} added", ticker);
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => {
                warn!("Symbol exists `{}`: not added again", ticker);
                Ok(())
            }
            Err(e) => {
                error!("Failed to add symbol {}: {}", ticker, e);
                Err(e.into())
            }
        }
    }

    async fn find_symbol(&self, ticker: &str) -> Result<Option<Symbol>, StoreError> {
        let symbol = sqlx::query_as::<_, Symbol>(
            "SELECT id, symbol, date_added FROM symbols WHERE symbol = $1",
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;

        Ok(symbol)
    }

    async fn record_exists(
        &self,
        symbol_id: i32,
        date: NaiveDate,
    ) -> Result<Option<FinancialRecord>, StoreError> {
        let record = sqlx::query_as::<_, FinancialRecord>(
            r#"
            SELECT id, symbol_id, date, open_price, close_price, volume, date_added
            FROM financial_data
            WHERE symbol_id = $1 AND date = $2
            "#,
        )
        .bind(symbol_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to check record for symbol {} on {}: {}", symbol_id, date, e);
            e
        })?;

        Ok(record)
    }

    async fn insert_record(&self, record: &NewFinancialRecord) -> Result<InsertOutcome, StoreError> {
        if self.record_exists(record.symbol_id, record.date).await?.is_some() {
            info!("Record for symbol {} on {} already ingested", record.symbol_id, record.date);
            return Ok(InsertOutcome::AlreadyExists);
        }

        self.insert_in_transaction(record).await
    }

    async fn count_records(&self, symbol_id: i32) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM financial_data WHERE symbol_id = $1",
        )
        .bind(symbol_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn query_range(
        &self,
        symbol_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<RecordPage, StoreError> {
        let records = sqlx::query_as::<_, FinancialRecord>(
            r#"
            SELECT id, symbol_id, date, open_price, close_price, volume, date_added
            FROM financial_data
            WHERE symbol_id = $1 AND date >= $2 AND date <= $3
            ORDER BY id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(symbol_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM financial_data
            WHERE symbol_id = $1 AND date >= $2 AND date <= $3
            "#,
        )
        .bind(symbol_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(RecordPage { records, total })
    }

    async fn query_all(
        &self,
        symbol_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FinancialRecord>, StoreError> {
        let records = sqlx::query_as::<_, FinancialRecord>(
            r#"
            SELECT id, symbol_id, date, open_price, close_price, volume, date_added
            FROM financial_data
            WHERE symbol_id = $1 AND date >= $2 AND date <= $3
            ORDER BY id
            "#,
        )
        .bind(symbol_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
