//! Event-date parsing and filter bounds.
//!
//! Transaction dates arrive either as a bare `YYYY-MM-DD` day or as a full
//! RFC 3339 timestamp and are stored as canonical UTC instants. Filter
//! bounds are inclusive on the day: a bare start date means midnight UTC,
//! a bare end date means the last microsecond of that day.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

/// Errors that can occur while parsing event dates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateParseError {
    /// Input is neither a bare date nor an RFC 3339 timestamp.
    #[error("unrecognized date '{0}', expected YYYY-MM-DD or RFC 3339")]
    Unrecognized(String),
}

fn parse_bare_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_micro_opt(23, 59, 59, 999_999)
        .map_or_else(|| start_of_day(date), |dt| dt.and_utc())
}

/// Parses a transaction event date into a canonical UTC instant.
///
/// Bare dates map to midnight UTC of that day; RFC 3339 timestamps are
/// converted to UTC as-is.
///
/// # Errors
///
/// Returns `DateParseError::Unrecognized` for anything else.
pub fn parse_event_date(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    if let Some(date) = parse_bare_date(input) {
        return Ok(start_of_day(date));
    }
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DateParseError::Unrecognized(input.to_string()))
}

/// Parses a range start bound; bare dates map to midnight UTC.
///
/// # Errors
///
/// Returns `DateParseError::Unrecognized` for unparsable input.
pub fn parse_range_start(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    parse_event_date(input)
}

/// Parses a range end bound; bare dates cover their whole day, so the bound
/// is the last microsecond of that day. RFC 3339 input is used as-is.
///
/// # Errors
///
/// Returns `DateParseError::Unrecognized` for unparsable input.
pub fn parse_range_end(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    if let Some(date) = parse_bare_date(input) {
        return Ok(end_of_day(date));
    }
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DateParseError::Unrecognized(input.to_string()))
}
