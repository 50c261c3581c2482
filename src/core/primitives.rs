use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{NarrativeError, NarrativeResult};

pub fn decimal_to_f64(value: Decimal, field_name: &str) -> NarrativeResult<f64> {
    value.to_f64().ok_or_else(|| {
        NarrativeError::InvalidData(format!("{field_name} cannot be represented as f64"))
    })
}

/// Parses a numeric cell. Blank cells are treated as zero, which the line
/// generator later renders as a gap.
pub fn parse_number_cell(raw: &str, field_name: &str) -> NarrativeResult<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|err| NarrativeError::InvalidData(format!("{field_name} `{trimmed}`: {err}")))?;
    decimal_to_f64(value, field_name)
}

pub fn parse_integer_cell(raw: &str, field_name: &str) -> NarrativeResult<i32> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i32>()
        .map_err(|err| NarrativeError::InvalidData(format!("{field_name} `{trimmed}`: {err}")))
}

/// Parses a compact `YYYYMMDD` stamp into midnight UTC.
pub fn parse_day_stamp(raw: &str) -> NarrativeResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    let date = NaiveDate::parse_from_str(trimmed, "%Y%m%d").map_err(|err| {
        NarrativeError::InvalidData(format!("timestamp `{trimmed}` is not YYYYMMDD: {err}"))
    })?;
    Ok(day_start(date))
}

/// Accepts either a `YYYYMMDD` stamp or an RFC 3339 date-time.
pub fn parse_instant(raw: &str) -> NarrativeResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return parse_day_stamp(trimmed);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| NarrativeError::InvalidData(format!("instant `{trimmed}`: {err}")))
}

#[must_use]
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[must_use]
pub fn datetime_to_unix_millis(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64
}

#[must_use]
pub fn unix_millis_to_datetime(millis: f64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis.round() as i64)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
