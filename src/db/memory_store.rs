use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;

use crate::db::{FinancialStore, InsertOutcome, RecordPage, StoreError};
use crate::models::{FinancialRecord, NewFinancialRecord, Symbol};

#[derive(Default)]
struct Tables {
    symbols: Vec<Symbol>,
    // keyed by (symbol_id, date), mirroring the UNIQUE constraint
    records: BTreeMap<(i32, NaiveDate), FinancialRecord>,
    next_record_id: i32,
}

/// In-memory store for tests. Counts every call so tests can assert the
/// store was (or was not) touched.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
    failing: AtomicBool,
    failing_dates: Mutex<Vec<NaiveDate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail as if the database were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every insert for `date` fail while other calls keep working.
    pub fn fail_inserts_on(&self, date: NaiveDate) {
        self.failing_dates.lock().push(date);
    }

    pub fn symbol_count(&self) -> usize {
        self.tables.lock().symbols.len()
    }

    pub fn record_count(&self) -> usize {
        self.tables.lock().records.len()
    }

    /// Seed a symbol and its records directly, bypassing the call counter.
    pub fn seed(&self, ticker: &str, rows: &[(NaiveDate, f64, f64, i64)]) -> i32 {
        let mut tables = self.tables.lock();
        let existing = tables.symbols.iter().find(|s| s.symbol == ticker).map(|s| s.id);
        let symbol_id = match existing {
            Some(id) => id,
            None => {
                let id = tables.symbols.len() as i32 + 1;
                tables.symbols.push(Symbol {
                    id,
                    symbol: ticker.to_string(),
                    date_added: Utc::now(),
                });
                id
            }
        };
        for &(date, open_price, close_price, volume) in rows {
            tables.next_record_id += 1;
            let id = tables.next_record_id;
            tables.records.insert(
                (symbol_id, date),
                FinancialRecord {
                    id,
                    symbol_id,
                    date,
                    open_price,
                    close_price,
                    volume,
                    date_added: Utc::now(),
                },
            );
        }
        symbol_id
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn in_range(&self, symbol_id: i32, start: NaiveDate, end: NaiveDate) -> Vec<FinancialRecord> {
        let mut rows: Vec<FinancialRecord> = self
            .tables
            .lock()
            .records
            .values()
            .filter(|r| r.symbol_id == symbol_id && r.date >= start && r.date <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        rows
    }
}

#[async_trait]
impl FinancialStore for MemoryStore {
    async fn upsert_symbol(&self, ticker: &str) -> Result<(), StoreError> {
        self.enter()?;
        let mut tables = self.tables.lock();
        if tables.symbols.iter().all(|s| s.symbol != ticker) {
            let id = tables.symbols.len() as i32 + 1;
            tables.symbols.push(Symbol {
                id,
                symbol: ticker.to_string(),
                date_added: Utc::now(),
            });
        }
        Ok(())
    }

    async fn find_symbol(&self, ticker: &str) -> Result<Option<Symbol>, StoreError> {
        self.enter()?;
        Ok(self.tables.lock().symbols.iter().find(|s| s.symbol == ticker).cloned())
    }

    async fn record_exists(
        &self,
        symbol_id: i32,
        date: NaiveDate,
    ) -> Result<Option<FinancialRecord>, StoreError> {
        self.enter()?;
        Ok(self.tables.lock().records.get(&(symbol_id, date)).cloned())
    }

    async fn insert_record(&self, record: &NewFinancialRecord) -> Result<InsertOutcome, StoreError> {
        self.enter()?;
        if self.failing_dates.lock().contains(&record.date) {
            return Err(StoreError::Db(sqlx::Error::PoolTimedOut));
        }
        let mut tables = self.tables.lock();
        let key = (record.symbol_id, record.date);
        if tables.records.contains_key(&key) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        tables.next_record_id += 1;
        let id = tables.next_record_id;
        tables.records.insert(
            key,
            FinancialRecord {
                id,
                symbol_id: record.symbol_id,
                date: record.date,
                open_price: record.open_price,
                close_price: record.close_price,
                volume: record.volume,
                date_added: Utc::now(),
            },
        );
        Ok(InsertOutcome::Inserted)
    }

    async fn count_records(&self, symbol_id: i32) -> Result<i64, StoreError> {
        self.enter()?;
        let count = self
            .tables
            .lock()
            .records
            .values()
            .filter(|r| r.symbol_id == symbol_id)
            .count();
        Ok(count as i64)
    }

    async fn query_range(
        &self,
        symbol_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<RecordPage, StoreError> {
        self.enter()?;
        let rows = self.in_range(symbol_id, start, end);
        let total = rows.len() as i64;
        let records = rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok(RecordPage { records, total })
    }

    async fn query_all(
        &self,
        symbol_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FinancialRecord>, StoreError> {
        self.enter()?;
        Ok(self.in_range(symbol_id, start, end))
    }
}
