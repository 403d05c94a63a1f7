//! Timestamp parsing for cell values
//!
//! Numbers are epoch milliseconds. Strings are tried against the date
//! layouts the spreadsheet export produces; naive values are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::model::CellValue;

/// Milliseconds since the Unix epoch
pub type TimestampMs = i64;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a cell value into a timestamp
pub fn parse_timestamp(value: &CellValue) -> Option<TimestampMs> {
    match value {
        CellValue::Number(n) if n.is_finite() => Some(n.trunc() as TimestampMs),
        CellValue::Number(_) | CellValue::Bool(_) => None,
        CellValue::Text(text) => parse_timestamp_str(text),
    }
}

/// Parse a string into a timestamp
pub fn parse_timestamp_str(text: &str) -> Option<TimestampMs> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            let midnight = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&midnight).timestamp_millis());
        }
    }

    if let Ok(ms) = text.parse::<i64>() {
        return Some(ms);
    }

    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|n| n.trunc() as TimestampMs)
}

/// Human readable rendering of a timestamp
pub fn format_timestamp(ts: TimestampMs) -> String {
    match Utc.timestamp_millis_opt(ts).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers_as_millis() {
        assert_eq!(parse_timestamp(&CellValue::Number(150.0)), Some(150));
        assert_eq!(parse_timestamp(&CellValue::Number(f64::NAN)), None);
        assert_eq!(parse_timestamp(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_parse_spreadsheet_layouts() {
        let expected = Utc.with_ymd_and_hms(2025, 12, 8, 10, 18, 4).unwrap().timestamp_millis();
        assert_eq!(parse_timestamp_str("2025-12-08 10:18:04"), Some(expected));
        assert_eq!(parse_timestamp_str("2025-12-08T10:18:04"), Some(expected));
        assert_eq!(parse_timestamp_str("2025/12/08 10:18:04"), Some(expected));
        assert_eq!(parse_timestamp_str("2025-12-08T10:18:04Z"), Some(expected));
        assert_eq!(parse_timestamp_str("2025-12-08 10:18:04.120"), Some(expected + 120));
    }

    #[test]
    fn test_parse_date_only_and_integers() {
        let midnight = Utc.with_ymd_and_hms(2025, 12, 8, 0, 0, 0).unwrap().timestamp_millis();
        assert_eq!(parse_timestamp_str("2025-12-08"), Some(midnight));
        assert_eq!(parse_timestamp_str(" 1700000000000 "), Some(1_700_000_000_000));
    }

    #[test]
    fn test_unparsable_text() {
        assert_eq!(parse_timestamp_str(""), None);
        assert_eq!(parse_timestamp_str("装置心跳"), None);
        assert_eq!(parse_timestamp_str("yesterday"), None);
    }

    #[test]
    fn test_format_round_trip() {
        let ts = parse_timestamp_str("2025-12-08 10:18:04").unwrap();
        assert_eq!(format_timestamp(ts), "2025-12-08 10:18:04");
    }
}
