use chrono::NaiveDate;
use tracing::warn;

use crate::errors::AppError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date.
///
/// The shape is checked before handing the string to chrono, which would
/// otherwise accept short years and unpadded fields.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    let bytes = raw.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !well_formed {
        warn!("error parsing date [{}]: expected YYYY-MM-DD", raw);
        return Err(AppError::InvalidDateFormat(raw.to_string()));
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
        warn!("error parsing date [{}]: {}", raw, e);
        AppError::InvalidDateFormat(raw.to_string())
    })
}

/// Returns the raw value unchanged unless it is required and absent or empty.
pub fn require_param<'a>(
    name: &str,
    raw: Option<&'a str>,
    required: bool,
) -> Result<Option<&'a str>, AppError> {
    match raw {
        Some(value) if !value.is_empty() => Ok(Some(value)),
        _ if required => Err(AppError::MissingParameter(name.to_string())),
        other => Ok(other),
    }
}

/// Parse a strictly positive integer parameter such as `limit` or `page`.
pub fn parse_int(name: &str, raw: &str) -> Result<i64, AppError> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        Ok(value) => {
            warn!("parameter `{}` must be positive, got {}", name, value);
            Err(AppError::WrongType(name.to_string()))
        }
        Err(e) => {
            warn!("parameter `{}` is not an integer ({}): {}", name, raw, e);
            Err(AppError::WrongType(name.to_string()))
        }
    }
}
