use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// One day of upstream data, still in the provider's string encoding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawDailyBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "4. close")]
    pub close: String,
    // The adjusted series reports volume as field 6, the plain one as field 5.
    #[serde(rename = "6. volume", alias = "5. volume")]
    pub volume: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyEntry {
    pub date: String,
    pub bar: RawDailyBar,
}

/// Daily series for a symbol, newest entry first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    pub entries: Vec<DailyEntry>,
}

impl DailySeries {
    pub fn most_recent(&self, n: usize) -> &[DailyEntry] {
        &self.entries[..self.entries.len().min(n)]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure, timeout or non-success HTTP status.
    #[error("Error making request to data provider")]
    Unavailable(String),

    /// The provider answered but reported a business error.
    #[error("{0}")]
    Rejected(String),

    #[error("unexpected provider payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_daily_series(&self, symbol: &str) -> Result<DailySeries, ProviderError>;
}
