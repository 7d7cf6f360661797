//! Paginated retrieval and date-range statistics over stored daily records.
//!
//! Both operations always produce an [`Envelope`]; validation problems and
//! unknown symbols are reported in `info.error`, unexpected failures are
//! logged and replaced by a generic message.

use tracing::{debug, error, info, warn};

use crate::db::FinancialStore;
use crate::errors::AppError;
use crate::models::{FinancialRecord, FinancialRecordView};
use crate::response::{Envelope, Pagination, ResponseMode, StatisticsData};
use crate::services::validation::{parse_date, parse_int};

/// Number of pages needed to show `count` records, `limit` per page.
pub fn page_count(count: i64, limit: i64) -> i64 {
    if limit <= 0 || count <= 0 {
        return 0;
    }
    count / limit + i64::from(count % limit != 0)
}

/// Round to `decimals` places.
///
/// Rounds the exact binary value of `value`, with exact ties going to the even
/// digit (0.125 -> 0.12, 0.375 -> 0.38). 0.015 is stored slightly below the
/// tie, so it becomes 0.01. Scaling by a power of ten first would lose that.
pub fn round_half_even(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

fn normalize_ticker(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn log_failure(operation: &str, symbol: &str, err: &AppError) {
    if err.is_validation() {
        warn!("{} for {} rejected: {}", operation, symbol, err);
    } else {
        error!("{} for {} failed: {:?}", operation, symbol, err);
    }
}

pub async fn paginate(
    store: &dyn FinancialStore,
    symbol: &str,
    start_date: &str,
    end_date: &str,
    limit: &str,
    page: &str,
) -> Envelope {
    match try_paginate(store, symbol, start_date, end_date, limit, page).await {
        Ok(envelope) => envelope,
        Err(e) => {
            log_failure("pagination", symbol, &e);
            Envelope::error(ResponseMode::Paginated, e.public_message())
        }
    }
}

async fn try_paginate(
    store: &dyn FinancialStore,
    symbol: &str,
    start_date: &str,
    end_date: &str,
    limit: &str,
    page: &str,
) -> Result<Envelope, AppError> {
    let limit = parse_int("limit", limit)?;
    let page = parse_int("page", page)?;
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;

    let Some(symbol_db) = store.find_symbol(&normalize_ticker(symbol)).await? else {
        info!("pagination requested for unknown symbol {}", symbol);
        return Ok(Envelope::paginated(
            Vec::new(),
            Pagination { count: 0, page, limit, pages: 0 },
            format!("symbol `{}` does not exist.", symbol),
        ));
    };

    // Counted over the symbol's whole history, not the requested range.
    let count = store.count_records(symbol_db.id).await?;
    let pages = page_count(count, limit);

    let mut error = String::new();
    if page > pages {
        error = format!("the page requested `{}` is above threshold", page);
    }

    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::WrongType("page".to_string()))?;
    let slice = store
        .query_range(symbol_db.id, start, end, limit, offset)
        .await?;
    debug!(
        "{}: {} records in range, {} overall, page {} of {}",
        symbol_db.symbol, slice.total, count, page, pages
    );

    if slice.records.is_empty() {
        error = "no records in that filter".to_string();
    }

    let data = slice
        .records
        .iter()
        .map(|r| FinancialRecordView::from_record(&symbol_db.symbol, r))
        .collect();

    Ok(Envelope::paginated(
        data,
        Pagination { count, page, limit, pages },
        error,
    ))
}

pub async fn calculate(
    store: &dyn FinancialStore,
    symbol: &str,
    start_date: &str,
    end_date: &str,
) -> Envelope {
    match try_calculate(store, symbol, start_date, end_date).await {
        Ok(envelope) => envelope,
        Err(e) => {
            log_failure("statistics", symbol, &e);
            Envelope::statistics(
                StatisticsData::empty(start_date, end_date, symbol),
                e.public_message(),
            )
        }
    }
}

async fn try_calculate(
    store: &dyn FinancialStore,
    symbol: &str,
    start_date: &str,
    end_date: &str,
) -> Result<Envelope, AppError> {
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;
    let empty = StatisticsData::empty(start_date, end_date, symbol);

    let Some(symbol_db) = store.find_symbol(&normalize_ticker(symbol)).await? else {
        info!("statistics requested for unknown symbol {}", symbol);
        return Ok(Envelope::statistics(empty, format!("symbol `{}` not found", symbol)));
    };

    let records = store.query_all(symbol_db.id, start, end).await?;
    if records.is_empty() {
        return Ok(Envelope::statistics(empty, "no records for that time frame"));
    }

    Ok(Envelope::statistics(averages(&records, empty), ""))
}

fn averages(records: &[FinancialRecord], base: StatisticsData) -> StatisticsData {
    let total = records.len() as f64;
    let (open_sum, close_sum, volume_sum) = records.iter().fold(
        (0.0_f64, 0.0_f64, 0.0_f64),
        |(open, close, volume), r| (open + r.open_price, close + r.close_price, volume + r.volume as f64),
    );

    StatisticsData {
        average_daily_open_price: round_half_even(open_sum / total, 2),
        average_daily_close_price: round_half_even(close_sum / total, 2),
        average_daily_volume: round_half_even(volume_sum / total, 2),
        ..base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_store::MemoryStore;
    use crate::response::Info;
    use chrono::{Duration, NaiveDate};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// `n` consecutive days starting 2023-01-01.
    fn seed_days(store: &MemoryStore, ticker: &str, n: i64) {
        let rows: Vec<_> = (0..n)
            .map(|i| (day(2023, 1, 1) + Duration::days(i), 10.0 + i as f64, 11.0 + i as f64, 100 + i))
            .collect();
        store.seed(ticker, &rows);
    }

    fn unpack_paginated(envelope: Envelope) -> (Vec<FinancialRecordView>, Pagination, Info) {
        match envelope {
            Envelope::Paginated { data, pagination, info } => (data, pagination, info),
            other => panic!("expected paginated envelope, got {:?}", other),
        }
    }

    fn unpack_statistics(envelope: Envelope) -> (StatisticsData, Info) {
        match envelope {
            Envelope::Statistics { data, info } => (data, info),
            other => panic!("expected statistics envelope, got {:?}", other),
        }
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(20, 10), 2);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(5, 0), 0);
        assert_eq!(page_count(5, i64::MAX), 1);
    }

    #[test]
    fn test_round_half_even_boundaries() {
        assert_eq!(round_half_even(0.125, 2), 0.12);
        assert_eq!(round_half_even(0.375, 2), 0.38);
        assert_eq!(round_half_even(0.625, 2), 0.62);
        assert_eq!(round_half_even(15.0, 2), 15.0);
        assert_eq!(round_half_even(123.456, 2), 123.46);
        assert_eq!(round_half_even(0.015, 2), 0.01);
        assert_eq!(round_half_even(99.975, 2), 99.97);
        assert_eq!(round_half_even(0.545, 2), 0.55);
    }

    #[tokio::test]
    async fn test_first_page() {
        let store = MemoryStore::new();
        seed_days(&store, "AAPL", 25);

        let envelope = paginate(&store, "AAPL", "2023-01-01", "2023-12-31", "10", "1").await;
        let (data, pagination, info) = unpack_paginated(envelope);

        assert_eq!(info.error, "");
        assert_eq!(pagination, Pagination { count: 25, page: 1, limit: 10, pages: 3 });
        assert_eq!(data.len(), 10);
        assert_eq!(data[0].symbol, "AAPL");
        assert_eq!(data[0].date, day(2023, 1, 1));
        assert_eq!(data[9].date, day(2023, 1, 10));
    }

    #[tokio::test]
    async fn test_last_partial_page() {
        let store = MemoryStore::new();
        seed_days(&store, "AAPL", 25);

        let (data, pagination, info) =
            unpack_paginated(paginate(&store, "AAPL", "2023-01-01", "2023-12-31", "10", "3").await);

        assert_eq!(info.error, "");
        assert_eq!(pagination.pages, 3);
        assert_eq!(data.len(), 5);
        assert_eq!(data[0].date, day(2023, 1, 21));
    }

    #[tokio::test]
    async fn test_page_above_threshold_is_reported() {
        let store = MemoryStore::new();
        seed_days(&store, "AAPL", 25);

        // Page 4 is empty, so the empty-filter message is the one that sticks.
        let (data, pagination, info) =
            unpack_paginated(paginate(&store, "AAPL", "2023-01-01", "2023-12-31", "10", "4").await);
        assert!(data.is_empty());
        assert_eq!(pagination, Pagination { count: 25, page: 4, limit: 10, pages: 3 });
        assert_eq!(info.error, "no records in that filter");
    }

    #[tokio::test]
    async fn test_page_within_range_has_no_error() {
        let store = MemoryStore::new();
        seed_days(&store, "IBM", 3);

        let (data, pagination, info) =
            unpack_paginated(paginate(&store, "IBM", "2023-01-01", "2023-12-31", "2", "2").await);
        assert_eq!(info.error, "");
        assert_eq!(pagination.pages, 2);
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].date, day(2023, 1, 3));
    }

    #[tokio::test]
    async fn test_count_reflects_full_history_not_filter() {
        let store = MemoryStore::new();
        seed_days(&store, "AAPL", 25);

        let (data, pagination, info) =
            unpack_paginated(paginate(&store, "AAPL", "2024-01-01", "2024-01-31", "10", "1").await);

        assert!(data.is_empty());
        assert_eq!(pagination.count, 25);
        assert_eq!(pagination.pages, 3);
        assert_eq!(info.error, "no records in that filter");
    }

    #[tokio::test]
    async fn test_date_range_is_inclusive() {
        let store = MemoryStore::new();
        seed_days(&store, "AAPL", 10);

        let (data, _, _) =
            unpack_paginated(paginate(&store, "AAPL", "2023-01-03", "2023-01-05", "10", "1").await);
        let dates: Vec<_> = data.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(2023, 1, 3), day(2023, 1, 4), day(2023, 1, 5)]);
    }

    #[tokio::test]
    async fn test_unknown_symbol_paginate() {
        let store = MemoryStore::new();

        let (data, pagination, info) =
            unpack_paginated(paginate(&store, "MSFT", "2023-01-01", "2023-01-31", "10", "1").await);

        assert!(data.is_empty());
        assert_eq!(pagination, Pagination { count: 0, page: 1, limit: 10, pages: 0 });
        assert_eq!(info.error, "symbol `MSFT` does not exist.");
    }

    #[tokio::test]
    async fn test_wrong_type_zeroes_pagination_and_skips_store() {
        let store = MemoryStore::new();
        seed_days(&store, "AAPL", 5);

        let (data, pagination, info) =
            unpack_paginated(paginate(&store, "AAPL", "2023-01-01", "2023-01-31", "ten", "1").await);
        assert!(data.is_empty());
        assert_eq!(pagination, Pagination::default());
        assert_eq!(info.error, "Wrong type in parameter");

        let (_, pagination, info) =
            unpack_paginated(paginate(&store, "AAPL", "2023/01/01", "2023-01-31", "10", "1").await);
        assert_eq!(pagination, Pagination::default());
        assert_eq!(info.error, "Wrong date format passed.");

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic() {
        let store = MemoryStore::new();
        seed_days(&store, "AAPL", 5);
        store.set_failing(true);

        let envelope = paginate(&store, "AAPL", "2023-01-01", "2023-01-31", "10", "1").await;
        assert_eq!(envelope.error_message(), "internal error occurred");

        let envelope = calculate(&store, "AAPL", "2023-01-01", "2023-01-31").await;
        assert_eq!(envelope.error_message(), "internal error occurred");
    }

    #[tokio::test]
    async fn test_calculate_averages() {
        let store = MemoryStore::new();
        store.seed(
            "IBM",
            &[(day(2023, 2, 1), 10.0, 12.0, 100), (day(2023, 2, 2), 20.0, 18.0, 300)],
        );

        let (data, info) = unpack_statistics(calculate(&store, "IBM", "2023-02-01", "2023-02-28").await);

        assert_eq!(info.error, "");
        assert_eq!(data.symbol, "IBM");
        assert_eq!(data.start_date, "2023-02-01");
        assert_eq!(data.end_date, "2023-02-28");
        assert_eq!(data.average_daily_open_price, 15.0);
        assert_eq!(data.average_daily_close_price, 15.0);
        assert_eq!(data.average_daily_volume, 200.0);
    }

    #[tokio::test]
    async fn test_calculate_rounds_half_to_even() {
        let store = MemoryStore::new();
        // open mean 0.125, close mean 0.375, volume mean 2.5
        store.seed(
            "IBM",
            &[
                (day(2023, 2, 1), 0.1, 0.3, 2),
                (day(2023, 2, 2), 0.15, 0.45, 3),
            ],
        );

        let (data, _) = unpack_statistics(calculate(&store, "IBM", "2023-02-01", "2023-02-02").await);
        assert_eq!(data.average_daily_open_price, 0.12);
        assert_eq!(data.average_daily_close_price, 0.38);
        assert_eq!(data.average_daily_volume, 2.5);
    }

    #[tokio::test]
    async fn test_calculate_rounds_from_binary_value() {
        let store = MemoryStore::new();
        // open mean 0.015, close mean 99.975; both sit just below the tie
        store.seed(
            "IBM",
            &[
                (day(2023, 2, 1), 0.01, 199.95, 1),
                (day(2023, 2, 2), 0.02, 0.0, 2),
            ],
        );

        let (data, info) = unpack_statistics(calculate(&store, "IBM", "2023-02-01", "2023-02-02").await);
        assert_eq!(info.error, "");
        assert_eq!(data.average_daily_open_price, 0.01);
        assert_eq!(data.average_daily_close_price, 99.97);
        assert_eq!(data.average_daily_volume, 1.5);
    }

    #[tokio::test]
    async fn test_calculate_only_uses_range() {
        let store = MemoryStore::new();
        store.seed(
            "IBM",
            &[
                (day(2023, 1, 31), 1000.0, 1000.0, 1000),
                (day(2023, 2, 1), 10.0, 12.0, 100),
                (day(2023, 2, 2), 20.0, 18.0, 300),
            ],
        );

        let (data, _) = unpack_statistics(calculate(&store, "IBM", "2023-02-01", "2023-02-02").await);
        assert_eq!(data.average_daily_open_price, 15.0);
    }

    #[tokio::test]
    async fn test_calculate_empty_range() {
        let store = MemoryStore::new();
        seed_days(&store, "IBM", 3);

        let (data, info) = unpack_statistics(calculate(&store, "IBM", "2022-01-01", "2022-01-31").await);
        assert_eq!(info.error, "no records for that time frame");
        assert_eq!(data.average_daily_open_price, 0.0);
        assert_eq!(data.average_daily_volume, 0.0);
        assert_eq!(data.symbol, "IBM");
    }

    #[tokio::test]
    async fn test_calculate_unknown_symbol() {
        let store = MemoryStore::new();

        let (data, info) = unpack_statistics(calculate(&store, "ZZZ", "2023-01-01", "2023-01-31").await);
        assert_eq!(info.error, "symbol `ZZZ` not found");
        assert_eq!(data.symbol, "ZZZ");
        assert_eq!(data.average_daily_close_price, 0.0);
    }

    #[tokio::test]
    async fn test_calculate_bad_date() {
        let store = MemoryStore::new();

        let (data, info) = unpack_statistics(calculate(&store, "IBM", "2023-13-01", "2023-01-31").await);
        assert_eq!(info.error, "Wrong date format passed.");
        assert_eq!(data.start_date, "2023-13-01");
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        seed_days(&store, "AAPL", 2);

        let (data, _, info) =
            unpack_paginated(paginate(&store, "aapl", "2023-01-01", "2023-01-31", "10", "1").await);
        assert_eq!(info.error, "");
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].symbol, "AAPL");
    }
}
