//! Helpers around the structured value type.
//!
//! Every value that lands in a snapshot or seed file is a [`serde_json::Value`].
//! The workspace enables `float_roundtrip`, so doubles are written in shortest
//! round-trip form and parsed back to the identical bit pattern.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::types::ColumnType;

/// Textual form used for date and time values in seed files.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Normalize a fetched value of a temporal column to `YYYY-MM-DD HH:MM:SS`.
///
/// Fractional seconds are kept when non-zero. Instants with a time zone are
/// converted to UTC. Values that do not parse as a date/time (e.g. `infinity`)
/// and non-temporal columns pass through unchanged.
pub fn normalize_temporal(column_type: &ColumnType, value: Value) -> Value {
    let Value::String(text) = &value else {
        return value;
    };

    let normalized = match column_type {
        ColumnType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0)),
        ColumnType::DateTime => parse_naive(text),
        ColumnType::Timestamp => DateTime::parse_from_rfc3339(text)
            .map(|instant| instant.with_timezone(&Utc).naive_utc())
            .ok()
            .or_else(|| parse_naive(text)),
        _ => None,
    };

    match normalized {
        Some(instant) => Value::String(instant.format(DATETIME_FORMAT).to_string()),
        None => value,
    }
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// Canonical text of a value for binding as a statement parameter.
///
/// `null` has no text; nested values are rendered as compact JSON.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
