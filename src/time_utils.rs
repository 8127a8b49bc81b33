// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and arithmetic.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format a UTC timestamp the way the MapMyFitness workout endpoint expects.
pub fn format_mmf_datetime(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Seconds between two instants, never negative.
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let millis = (end - start).num_milliseconds().max(0);
    millis as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_mmf_datetime() {
        let date = Utc.with_ymd_and_hms(2014, 3, 9, 17, 5, 42).unwrap();
        assert_eq!(format_mmf_datetime(date), "2014-03-09 17:05:42 UTC");
        assert_eq!(format_utc_rfc3339(date), "2014-03-09T17:05:42Z");
    }

    #[test]
    fn test_elapsed_seconds() {
        let start = Utc.with_ymd_and_hms(2014, 3, 9, 17, 5, 0).unwrap();
        let end = start + Duration::milliseconds(42_500);
        assert_eq!(elapsed_seconds(start, end), 42.5);
        // Clock skew never produces a negative duration
        assert_eq!(elapsed_seconds(end, start), 0.0);
    }
}
