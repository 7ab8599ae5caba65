use crate::error::{Result, ScanError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 timestamp and normalizes it to UTC. A trailing `Z` is
/// UTC and a missing offset is assumed to be UTC.
pub fn parse_iso_datetime(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    let value = match trimmed.strip_suffix('Z').or_else(|| trimmed.strip_suffix('z')) {
        Some(head) => format!("{head}+00:00"),
        None => trimmed.to_string(),
    };

    // RFC3339
    if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&value, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&value, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    // YYYY-MM-DD
    if let Ok(date) = NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&datetime));
        }
    }

    Err(ScanError::InvalidWindow(format!(
        "'{input}' is not an ISO-8601 timestamp"
    )))
}

pub fn minutes_between(later: &DateTime<Utc>, earlier: &DateTime<Utc>) -> f64 {
    (*later - *earlier).num_milliseconds() as f64 / 60_000.0
}

pub fn hours_between(later: &DateTime<Utc>, earlier: &DateTime<Utc>) -> f64 {
    (*later - *earlier).num_milliseconds() as f64 / 3_600_000.0
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
