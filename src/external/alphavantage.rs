use crate::external::price_provider::{DailyEntry, DailySeries, PriceProvider, ProviderError, RawDailyBar};
use crate::external::throttle::RequestThrottle;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    throttle: RequestThrottle,
}

impl AlphaVantageProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        throttle: RequestThrottle,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            throttle,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AvDailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, RawDailyBar>>,

    // { "Error Message": "Invalid API call. ..." } for unknown symbols
    #[serde(rename = "Error Message")]
    error_message: Option<String>,

    // Throttle responses come back as "Note" or "Information"
    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Information")]
    information: Option<String>,
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    async fn fetch_daily_series(&self, symbol: &str) -> Result<DailySeries, ProviderError> {
        let symbol = symbol.to_uppercase();
        let url = format!("{}/query", self.base_url);

        let _permit = self.throttle.acquire().await;
        info!("Requesting daily series for {}", symbol);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("function", "TIME_SERIES_DAILY_ADJUSTED"),
                ("symbol", symbol.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Request to data provider failed for {}: {}", symbol, e);
                ProviderError::Unavailable(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            error!("Data provider returned {} for {}", status, symbol);
            return Err(ProviderError::Unavailable(format!("status {}", status)));
        }

        let body = resp
            .json::<AvDailyResponse>()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        if let Some(msg) = body.error_message {
            warn!("Data provider rejected {}: {}", symbol, msg);
            return Err(ProviderError::Rejected(msg));
        }

        if let Some(msg) = body.note.or(body.information) {
            warn!("Data provider throttled request for {}: {}", symbol, msg);
            return Err(ProviderError::Rejected(msg));
        }

        let series = body
            .time_series
            .ok_or_else(|| ProviderError::Malformed("missing time series".into()))?;

        // Dates are YYYY-MM-DD so lexical order is chronological; reverse for newest first.
        let entries = series
            .into_iter()
            .rev()
            .map(|(date, bar)| DailyEntry { date, bar })
            .collect::<Vec<_>>();

        info!("Received {} daily entries for {}", entries.len(), symbol);
        Ok(DailySeries { entries })
    }
}
