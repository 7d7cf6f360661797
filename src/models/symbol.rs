use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// A ticker known to the system. Created on first successful ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Symbol {
    pub id: i32,
    pub symbol: String,
    pub date_added: DateTime<Utc>,
}
