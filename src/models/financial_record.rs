use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One daily observation for a symbol. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FinancialRecord {
    pub id: i32,
    pub symbol_id: i32,
    pub date: NaiveDate,
    pub open_price: f64,
    pub close_price: f64,
    pub volume: i64,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFinancialRecord {
    pub symbol_id: i32,
    pub date: NaiveDate,
    pub open_price: f64,
    pub close_price: f64,
    pub volume: i64,
}

/// Public shape of a record as returned by the API and the ingestion report.
///
/// Field order is part of the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecordView {
    pub symbol: String,
    pub date: NaiveDate,
    pub open_price: f64,
    pub close_price: f64,
    pub volume: i64,
}

impl FinancialRecordView {
    pub fn from_record(ticker: &str, record: &FinancialRecord) -> Self {
        Self {
            symbol: ticker.to_string(),
            date: record.date,
            open_price: record.open_price,
            close_price: record.close_price,
            volume: record.volume,
        }
    }
}
