use crate::shared::time::TimeParser;
use chrono::{TimeZone, Utc};

#[test]
fn parses_rfc3339_z() {
    let got = TimeParser::parse_str("2025-09-07T12:34:56Z").unwrap();
    let expected = Utc.with_ymd_and_hms(2025, 9, 7, 12, 34, 56).single().unwrap();
    assert_eq!(got, expected);
}

#[test]
fn parses_rfc3339_with_offset() {
    let got = TimeParser::parse_str("2025-09-07T12:34:56+02:30").unwrap();
    // 12:34:56+02:30 == 10:04:56Z
    let expected = Utc.with_ymd_and_hms(2025, 9, 7, 10, 4, 56).single().unwrap();
    assert_eq!(got, expected);
}

#[test]
fn parses_naive_datetime_as_utc() {
    let got = TimeParser::parse_str("2025-09-07T08:00:00").unwrap();
    let spaced = TimeParser::parse_str("2025-09-07 08:00:00.250").unwrap();
    let expected = Utc.with_ymd_and_hms(2025, 9, 7, 8, 0, 0).single().unwrap();
    assert_eq!(got, expected);
    assert_eq!(spaced.timestamp_millis(), expected.timestamp_millis() + 250);
}

#[test]
fn parses_date_only_to_midnight_utc() {
    let got = TimeParser::parse_str("2025-09-07").unwrap();
    let expected = Utc.with_ymd_and_hms(2025, 9, 7, 0, 0, 0).single().unwrap();
    assert_eq!(got, expected);
}

#[test]
fn parses_numeric_string_as_epoch_millis() {
    let got = TimeParser::parse_str(" 1700000000000 ").unwrap();
    assert_eq!(got.timestamp_millis(), 1_700_000_000_000);
}

#[test]
fn rejects_garbage() {
    assert!(TimeParser::parse_str("yesterday-ish").is_none());
    assert!(TimeParser::from_epoch_millis_f64(f64::NAN).is_none());
}

#[test]
fn renders_with_millisecond_precision() {
    let epoch = TimeParser::from_epoch_millis(0).unwrap();
    assert_eq!(TimeParser::to_iso_millis(&epoch), "1970-01-01T00:00:00.000Z");
}
