// src/ingest/timestamp.rs
//! Timestamp parsing shared by all three exports.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Naive layouts seen in exports, most specific first.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an export timestamp.
///
/// Zoned RFC 3339 stamps are converted to UTC wall-clock; naive stamps are
/// returned as written. A bare date maps to midnight. `None` when nothing fits.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }

    // "2024-03-05 10:00:00 UTC" and a trailing "Z" without the "T" separator
    let s = s
        .strip_suffix(" UTC")
        .or_else(|| s.strip_suffix('Z'))
        .unwrap_or(s);

    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// 12-hour label without a leading zero: 0 → "12 AM", 13 → "1 PM".
pub fn hour_label(hour: u32) -> String {
    match NaiveTime::from_hms_opt(hour, 0, 0) {
        Some(t) => t.format("%-I %p").to_string(),
        None => hour.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn spotify_minute_precision() {
        let t = parse_timestamp("2024-03-05 10:07").unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (2024, 3, 5));
        assert_eq!((t.hour(), t.minute(), t.second()), (10, 7, 0));
    }

    #[test]
    fn naive_seconds_and_fraction() {
        assert!(parse_timestamp("2024-03-05 10:00:00").is_some());
        assert!(parse_timestamp("2024-03-05T10:00:00.250").is_some());
    }

    #[test]
    fn zoned_is_converted_to_utc() {
        let t = parse_timestamp("2024-01-01T01:30:00+02:00").unwrap();
        assert_eq!((t.year(), t.month(), t.day(), t.hour()), (2023, 12, 31, 23));
        let z = parse_timestamp("2024-06-01T08:15:42.123Z").unwrap();
        assert_eq!(z.hour(), 8);
    }

    #[test]
    fn garbage_is_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-40 10:00").is_none());
    }

    #[test]
    fn hour_labels() {
        assert_eq!(hour_label(0), "12 AM");
        assert_eq!(hour_label(9), "9 AM");
        assert_eq!(hour_label(12), "12 PM");
        assert_eq!(hour_label(13), "1 PM");
        assert_eq!(hour_label(23), "11 PM");
    }
}
