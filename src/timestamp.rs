//! Lenient timestamp parsing for store records
//!
//! Run and order rows carry `created_at` as whatever the writer stored: text in
//! one of a few layouts, integer unix seconds, or nothing at all. Callers get an
//! `Option<NaiveDateTime>` back and decide what "unknown" means for them.

use chrono::{DateTime, NaiveDateTime};
use rusqlite::types::ValueRef;

/// Text layouts accepted for `created_at`, tried in this order.
pub const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Raw timestamp as read from a store column
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampValue {
    Native(NaiveDateTime),
    Unix(i64),
    Text(String),
    Null,
}

impl TimestampValue {
    /// Capture a SQLite column value without interpreting it yet
    pub fn from_sql(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Integer(secs) => TimestampValue::Unix(secs),
            ValueRef::Real(secs) => TimestampValue::Unix(secs as i64),
            ValueRef::Text(bytes) => {
                TimestampValue::Text(String::from_utf8_lossy(bytes).into_owned())
            }
            ValueRef::Null | ValueRef::Blob(_) => TimestampValue::Null,
        }
    }
}

impl From<NaiveDateTime> for TimestampValue {
    fn from(value: NaiveDateTime) -> Self {
        TimestampValue::Native(value)
    }
}

impl From<&str> for TimestampValue {
    fn from(value: &str) -> Self {
        TimestampValue::Text(value.to_string())
    }
}

/// Parse a stored timestamp, returning `None` for anything unrecognised
pub fn parse_timestamp(value: &TimestampValue) -> Option<NaiveDateTime> {
    match value {
        TimestampValue::Native(dt) => Some(*dt),
        TimestampValue::Unix(secs) => DateTime::from_timestamp(*secs, 0).map(|dt| dt.naive_utc()),
        TimestampValue::Text(text) => parse_text(text.trim()),
        TimestampValue::Null => None,
    }
}

fn parse_text(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}
