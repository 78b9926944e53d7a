//! Timestamp parsing and the reference time zone.
//!
//! Both sources are compared in US Eastern time, the zone NBA schedules are
//! published in. Calendar-date equality is evaluated there, not in UTC.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{America::New_York, Tz};

use crate::error::EventError;

/// The reference zone all cross-source comparisons use.
pub const REFERENCE_ZONE: Tz = New_York;

/// Offset-carrying formats tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Naive formats, read as UTC wall-clock time.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a timestamp from either source.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, EventError> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }

    Err(EventError::InvalidTimestamp(raw.to_string()))
}

/// Parse a timestamp and express it in the reference zone.
pub fn parse_in_reference_zone(raw: &str) -> Result<DateTime<Tz>, EventError> {
    parse_timestamp(raw).map(|dt| dt.with_timezone(&REFERENCE_ZONE))
}

/// Express an instant in the reference zone.
pub fn in_reference_zone(instant: DateTime<Utc>) -> DateTime<Tz> {
    instant.with_timezone(&REFERENCE_ZONE)
}
