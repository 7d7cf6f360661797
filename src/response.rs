//! Response envelopes shared by every endpoint and the ingestion report.
//!
//! Each envelope carries an `info.error` string which is empty on success.
//! Numeric fields default to zero and are never serialized as null.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::FinancialRecordView;

/// Selects which of the three envelope shapes a response uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Paginated,
    Statistics,
    Info,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub error: String,
}

impl Info {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub count: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsData {
    pub start_date: String,
    pub end_date: String,
    pub symbol: String,
    pub average_daily_open_price: f64,
    pub average_daily_close_price: f64,
    pub average_daily_volume: f64,
}

impl StatisticsData {
    /// Echoes the request with all averages at zero.
    pub fn empty(start_date: &str, end_date: &str, symbol: &str) -> Self {
        Self {
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Paginated {
        data: Vec<FinancialRecordView>,
        pagination: Pagination,
        info: Info,
    },
    Statistics {
        data: StatisticsData,
        info: Info,
    },
    Info {
        info: Info,
    },
}

impl Envelope {
    pub fn paginated(
        data: Vec<FinancialRecordView>,
        pagination: Pagination,
        error: impl Into<String>,
    ) -> Self {
        Envelope::Paginated {
            data,
            pagination,
            info: Info::error(error),
        }
    }

    pub fn statistics(data: StatisticsData, error: impl Into<String>) -> Self {
        Envelope::Statistics {
            data,
            info: Info::error(error),
        }
    }

    pub fn info(error: impl Into<String>) -> Self {
        Envelope::Info {
            info: Info::error(error),
        }
    }

    /// Builds the zero-valued envelope of the given mode carrying `message`.
    pub fn error(mode: ResponseMode, message: impl Into<String>) -> Self {
        match mode {
            ResponseMode::Paginated => {
                Envelope::paginated(Vec::new(), Pagination::default(), message)
            }
            ResponseMode::Statistics => {
                Envelope::statistics(StatisticsData::default(), message)
            }
            ResponseMode::Info => Envelope::info(message),
        }
    }

    pub fn mode(&self) -> ResponseMode {
        match self {
            Envelope::Paginated { .. } => ResponseMode::Paginated,
            Envelope::Statistics { .. } => ResponseMode::Statistics,
            Envelope::Info { .. } => ResponseMode::Info,
        }
    }

    pub fn error_message(&self) -> &str {
        match self {
            Envelope::Paginated { info, .. }
            | Envelope::Statistics { info, .. }
            | Envelope::Info { info } => &info.error,
        }
    }
}

// Errors travel inside the body, so the status is always 200.
impl IntoResponse for Envelope {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
