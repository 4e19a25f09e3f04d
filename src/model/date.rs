//! Timestamp normalization.
//!
//! Every adapter funnels its source timestamps through this module so that all canonical lines
//! share one format, which also sorts lexically in chronological order.

use crate::Result;
use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDateTime, Utc};

/// The canonical date format, e.g. `2024-03-01 09:15:00 UTC`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

const UTC_SUFFIX: &str = " UTC";

/// Naive formats seen across exports, all interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Some exchange exports abbreviate the year to two digits: `22-01-15 10:20:30`.
const SHORT_YEAR_FORMAT: &str = "%y-%m-%d %H:%M:%S";

/// Converts a source timestamp into the canonical format.
pub fn normalize(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(UTC_SUFFIX).unwrap_or(trimmed);

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(format(dt.with_timezone(&Utc)));
    }

    if trimmed.find('-') == Some(2) {
        let naive = NaiveDateTime::parse_from_str(trimmed, SHORT_YEAR_FORMAT)
            .with_context(|| format!("Unable to parse the date '{raw}'"))?;
        return Ok(format(naive.and_utc()));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(format(naive.and_utc()));
        }
    }

    bail!("Unable to parse the date '{raw}'")
}

/// Converts a column holding Unix seconds into the canonical format.
pub fn from_unix(raw: &str) -> Result<String> {
    let seconds: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("'{raw}' is not a Unix timestamp"))?;
    let dt = DateTime::from_timestamp(seconds, 0)
        .with_context(|| format!("Unix timestamp {seconds} is out of range"))?;
    Ok(format(dt))
}

fn format(dt: DateTime<Utc>) -> String {
    dt.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain() {
        assert_eq!(
            normalize("2022-11-30 10:00:05").unwrap(),
            "2022-11-30 10:00:05 UTC"
        );
    }

    #[test]
    fn test_normalize_rfc3339_with_offset() {
        assert_eq!(
            normalize("2022-11-30T12:00:05+02:00").unwrap(),
            "2022-11-30 10:00:05 UTC"
        );
        assert_eq!(
            normalize("2022-11-30T10:00:05.000Z").unwrap(),
            "2022-11-30 10:00:05 UTC"
        );
    }

    #[test]
    fn test_normalize_short_year() {
        assert_eq!(
            normalize("22-01-15 10:20:30").unwrap(),
            "2022-01-15 10:20:30 UTC"
        );
    }

    #[test]
    fn test_normalize_day_first() {
        assert_eq!(
            normalize("05/03/2023 08:00:00").unwrap(),
            "2023-03-05 08:00:00 UTC"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("2023-06-01 00:00:00").unwrap();
        assert_eq!(normalize(&once).unwrap(), once);
    }

    #[test]
    fn test_normalize_garbage() {
        assert!(normalize("yesterday").is_err());
        assert!(normalize("").is_err());
    }

    #[test]
    fn test_from_unix() {
        assert_eq!(from_unix("1700000000").unwrap(), "2023-11-14 22:13:20 UTC");
        assert!(from_unix("soon").is_err());
    }

    #[test]
    fn test_canonical_dates_sort_chronologically() {
        let mut dates = vec![
            normalize("2024-01-02 00:00:00").unwrap(),
            normalize("2023-12-31 23:59:59").unwrap(),
            normalize("2024-01-01 12:00:00").unwrap(),
        ];
        dates.sort();
        assert_eq!(dates[0], "2023-12-31 23:59:59 UTC");
        assert_eq!(dates[2], "2024-01-02 00:00:00 UTC");
    }
}
