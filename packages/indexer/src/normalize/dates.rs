//! Date helpers shared by the record model and output fields.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ISO8601_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})Z$").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d{4})").expect("valid regex"));

/// Validate a full ISO 8601 UTC instant (`YYYY-MM-DDThh:mm:ssZ`).
///
/// # Returns
/// The Unix timestamp of the instant, or `None` if the string is malformed or
/// names a day that does not exist.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::validate_iso8601_date;
///
/// assert_eq!(validate_iso8601_date("1970-01-02T00:00:00Z"), Some(86_400));
/// assert_eq!(validate_iso8601_date("1970-02-30T00:00:00Z"), None);
/// assert_eq!(validate_iso8601_date("1970-01-02"), None);
/// ```
pub fn validate_iso8601_date(date: &str) -> Option<i64> {
    let caps = ISO8601_PATTERN.captures(date)?;
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let day = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?;
    let instant: NaiveDateTime = day.and_hms_opt(field(4)?, field(5)?, field(6)?)?;

    Some(instant.and_utc().timestamp())
}

/// Format a date range the way Solr range queries expect.
///
/// Identical days collapse to a single date, otherwise `[start TO end]`.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::date_range_to_str;
///
/// assert_eq!(
///     date_range_to_str("1900-01-01T00:00:00Z", "1902-12-31T23:59:59Z"),
///     "[1900-01-01 TO 1902-12-31]"
/// );
/// assert_eq!(
///     date_range_to_str("1975-06-12T00:00:00Z", "1975-06-12T23:59:59Z"),
///     "1975-06-12"
/// );
/// ```
pub fn date_range_to_str(start: &str, end: &str) -> String {
    let day = |s: &str| s.split('T').next().unwrap_or(s).to_string();
    let (start, end) = (day(start), day(end));
    if start == end {
        start
    } else {
        format!("[{start} TO {end}]")
    }
}

/// Format a Unix timestamp as an ISO 8601 UTC instant.
pub fn format_timestamp(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

/// Extract the first four-digit year, with an optional minus sign.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::extract_year;
///
/// assert_eq!(extract_year("um 1910/1915"), "1910");
/// assert_eq!(extract_year("-0500-01-01T00:00:00Z"), "-0500");
/// assert_eq!(extract_year("undatiert"), "");
/// ```
pub fn extract_year(s: &str) -> String {
    YEAR_PATTERN
        .find(s)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_iso8601_date_ranges() {
        assert!(validate_iso8601_date("2024-02-29T23:59:59Z").is_some());
        assert!(validate_iso8601_date("2023-02-29T00:00:00Z").is_none());
        assert!(validate_iso8601_date("2024-13-01T00:00:00Z").is_none());
        assert!(validate_iso8601_date("2024-01-01T24:00:00Z").is_none());
        assert!(validate_iso8601_date("2024-01-01T00:60:00Z").is_none());
    }

    #[test]
    fn test_validate_iso8601_date_negative_year() {
        assert!(validate_iso8601_date("-0500-01-01T00:00:00Z").is_some());
    }

    #[test]
    fn test_format_timestamp_round_trip() {
        let ts = validate_iso8601_date("2001-09-09T01:46:40Z").unwrap();
        assert_eq!(ts, 1_000_000_000);
        assert_eq!(format_timestamp(ts).unwrap(), "2001-09-09T01:46:40Z");
    }
}
