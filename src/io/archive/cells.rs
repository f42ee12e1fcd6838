//! Cell encoding shared by the archive tables.
//!
//! Absent values are empty cells. Timestamps are RFC 3339 in UTC, ids are
//! decimal integers.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Formats a timestamp cell.
#[must_use]
pub fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Formats an optional timestamp cell.
#[must_use]
pub fn optional_timestamp(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(timestamp).unwrap_or_default()
}

/// Formats an optional displayable cell.
#[must_use]
pub fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Returns the trimmed cell, or `None` if it is empty.
#[must_use]
pub fn non_empty(cell: Option<&String>) -> Option<&str> {
    cell.map(|c| c.trim()).filter(|c| !c.is_empty())
}

/// Returns a free-text cell verbatim, or `None` if it is exactly empty.
#[must_use]
pub fn text(cell: Option<&String>) -> Option<String> {
    cell.filter(|c| !c.is_empty()).cloned()
}

/// Parses a timestamp cell; empty or malformed cells yield `None`.
///
/// Accepts RFC 3339 and the space-separated `YYYY-MM-DD HH:MM:SS` form.
#[must_use]
pub fn parse_timestamp(cell: Option<&String>) -> Option<DateTime<Utc>> {
    let text = non_empty(cell)?;
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .map(|naive| naive.and_utc())
        })
        .ok()
}

/// Parses a UUID cell; empty or malformed cells yield `None`.
#[must_use]
pub fn parse_uuid(cell: Option<&String>) -> Option<Uuid> {
    non_empty(cell).and_then(|text| Uuid::parse_str(text).ok())
}

/// Parses an integer id cell.
#[must_use]
pub fn parse_id(cell: Option<&String>) -> Option<i64> {
    non_empty(cell).and_then(|text| text.parse().ok())
}
