//! Shared parsing utilities for incident data sources.
//!
//! Socrata returns every column as a string, but coordinates occasionally
//! arrive as JSON numbers, so the coordinate helpers accept either.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses a Socrata datetime string (ISO 8601 with optional fractional
/// seconds, or RFC 3339 with an offset).
#[must_use]
pub fn parse_socrata_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Formats a timestamp the way Socrata `$where` clauses expect.
#[must_use]
pub fn format_socrata_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Coerces a JSON value (string or number) to a coordinate component.
/// Returns `None` if missing, unparseable, non-finite, or zero.
#[must_use]
pub fn parse_coordinate(value: Option<&serde_json::Value>) -> Option<f64> {
    let parsed = match value? {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !parsed.is_finite() || parsed == 0.0 {
        return None;
    }
    Some(parsed)
}

/// Parses a latitude/longitude pair, rejecting out-of-range values.
#[must_use]
pub fn parse_lat_lng(
    lat: Option<&serde_json::Value>,
    lng: Option<&serde_json::Value>,
) -> (Option<f64>, Option<f64>) {
    let latitude = parse_coordinate(lat).filter(|v| (-90.0..=90.0).contains(v));
    let longitude = parse_coordinate(lng).filter(|v| (-180.0..=180.0).contains(v));
    (latitude, longitude)
}

/// Trims a string field, mapping empty results to `None`.
#[must_use]
pub fn clean_string(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
