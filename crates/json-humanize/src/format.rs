//! Scalar formatters used by the JSON rewrite.

use chrono::{DateTime, Local, SecondsFormat};
use humansize::{DECIMAL, FormatSizeOptions, format_size};

/// Sizes below this are printed as a plain byte count.
const UNIT: u64 = 1000;

/// Format a byte count with base-1000 units and one decimal digit.
///
/// Values below 1000 are printed as an integer count of bytes.
///
/// ```
/// use json_humanize::format_bytes;
///
/// assert_eq!(format_bytes(999), "999 B");
/// assert_eq!(format_bytes(1_500_000), "1.5 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let options = FormatSizeOptions::from(DECIMAL)
        .decimal_places(1)
        .decimal_zeroes(1);
    format_size(bytes, options)
}

/// Render a nanosecond Unix timestamp as RFC 3339 in the local offset.
///
/// Seconds precision; a zero offset is written as `Z`.
pub fn format_timestamp_nanos(nanos: i64) -> String {
    DateTime::from_timestamp_nanos(nanos)
        .with_timezone(&Local)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Round a usage percentage to one decimal place.
#[inline]
pub fn round_percentage(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round a usage percentage and print it with exactly one fractional digit.
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}", round_percentage(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(999), "999 B");
        assert_eq!(format_bytes(1000), "1.0 kB");
        assert_eq!(format_bytes(1_500_000), "1.5 MB");
        assert_eq!(format_bytes(1_000_000_000), "1.0 GB");
        assert_eq!(format_bytes(2_500_000_000_000), "2.5 TB");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(33.27), "33.3");
        assert_eq!(format_percentage(33.0), "33.0");
        assert_eq!(format_percentage(33.96), "34.0");
        assert_eq!(format_percentage(0.04), "0.0");
    }

    #[test]
    fn test_round_percentage_half_away_from_zero() {
        assert_eq!(round_percentage(12.25), 12.3);
        assert_eq!(round_percentage(100.0), 100.0);
    }

    #[test]
    fn test_format_timestamp_nanos_round_trips_seconds() {
        let nanos: i64 = 1_700_000_000_123_456_789;
        let rendered = format_timestamp_nanos(nanos);

        let parsed = DateTime::parse_from_rfc3339(&rendered).unwrap();
        assert_eq!(parsed.timestamp(), 1_700_000_000);
        // Seconds precision only
        assert!(!rendered.contains('.'));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_small_byte_counts_are_plain(bytes in 0u64..1000) {
            prop_assert_eq!(format_bytes(bytes), format!("{} B", bytes));
        }

        #[test]
        fn prop_scaled_byte_counts_have_one_decimal(bytes in 1000u64..=u64::MAX) {
            let rendered = format_bytes(bytes);
            let (number, unit) = rendered.split_once(' ').unwrap();
            let (_, fraction) = number.split_once('.').unwrap();
            prop_assert_eq!(fraction.len(), 1);
            prop_assert!(["kB", "MB", "GB", "TB", "PB", "EB"].contains(&unit));
        }
    }
}
