//! Column encoding shared by every repository.
//!
//! Identifiers are stored as hyphenated UUID text, enums by their wire name
//! and timestamps as RFC 3339 with microseconds in UTC so that text ordering
//! matches chronological ordering.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use pmtrack_domain::time::Timestamp;

fn decode_error<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn encode_timestamp(value: Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn encode_optional_timestamp(value: Option<Timestamp>) -> Option<String> {
    value.map(encode_timestamp)
}

/// Parse a column holding the text form of a `FromStr` value (ids, enums).
pub(crate) fn parsed<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(decode_error)
}

pub(crate) fn optional_parsed<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| T::from_str(&s))
        .transpose()
        .map_err(decode_error)
}

pub(crate) fn timestamp(row: &SqliteRow, column: &str) -> Result<Timestamp, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|value| value.to_utc())
        .map_err(decode_error)
}

pub(crate) fn optional_timestamp(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<Timestamp>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| DateTime::parse_from_rfc3339(&s).map(|value| value.to_utc()))
        .transpose()
        .map_err(decode_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn should_order_encoded_timestamps_chronologically() {
        let early = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let late = early + chrono::Duration::microseconds(1);
        assert!(encode_timestamp(early) < encode_timestamp(late));
        assert_eq!(encode_timestamp(early), "2024-01-02T03:04:05.000000Z");
    }
}
