//! Timestamp parsing for event bodies.
//!
//! Instants arrive either as RFC 3339 strings or as naive wall-clock strings
//! such as `2024-01-01 09:00:00`. Naive values carry no zone and are read as
//! UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Wall-clock format the calendar client sends.
pub const NAIVE_WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

pub fn format_naive(value: NaiveDateTime) -> String {
    value.format(NAIVE_WIRE_FORMAT).to_string()
}
