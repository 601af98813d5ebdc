use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Utility for turning loosely formatted time inputs into UTC instants.
pub struct TimeParser;

impl TimeParser {
    /// Parse a string representing a time instant.
    /// Supports RFC3339/ISO-8601, naive date-times (read as UTC), date-only
    /// (YYYY-MM-DD) and integer epoch milliseconds.
    pub fn parse_str(input: &str) -> Option<DateTime<Utc>> {
        let s = input.trim();
        // Try RFC3339/ISO-8601 first
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
        // Fallback: numeric string
        if let Ok(ms) = s.parse::<i64>() {
            return Self::from_epoch_millis(ms);
        }
        None
    }

    pub fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(ms).single()
    }

    /// Fractional milliseconds are truncated toward negative infinity.
    pub fn from_epoch_millis_f64(ms: f64) -> Option<DateTime<Utc>> {
        if !ms.is_finite() || ms.abs() > i64::MAX as f64 {
            return None;
        }
        Self::from_epoch_millis(ms.floor() as i64)
    }

    /// `1970-01-01T00:00:00.000Z` style rendering.
    pub fn to_iso_millis(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
