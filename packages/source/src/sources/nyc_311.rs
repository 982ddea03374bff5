//! New York City 311 service request data source.
//!
//! Uses NYC's Socrata Open Data API (311 Service Requests from 2010 to
//! Present). Dataset: <https://data.cityofnewyork.us/resource/erm2-nwe9>

use std::time::Duration;

use async_trait::async_trait;
use civic_safety_incident_models::{Borough, IncidentRecord, IncidentScope};
use serde::Deserialize;

use crate::parsing::{clean_string, parse_lat_lng, parse_socrata_date};
use crate::socrata::{SocrataConfig, build_where, fetch_socrata};
use crate::{FetchWindow, IncidentSource, SourceError};

/// Default dataset endpoint.
pub const API_URL: &str = "https://data.cityofnewyork.us/resource/erm2-nwe9.json";

/// Timeout for each page request of the bulk incident fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_PAGE_SIZE: u64 = 50_000;

/// NYC 311 service request data source.
pub struct Nyc311Source {
    client: reqwest::Client,
    api_url: String,
    app_token: Option<String>,
    page_size: u64,
    max_records: Option<u64>,
}

impl Nyc311Source {
    /// Creates a source pointed at the public dataset with a 60 second
    /// request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: API_URL.to_string(),
            app_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            max_records: None,
        })
    }

    /// Overrides the dataset endpoint.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sets the Socrata application token.
    #[must_use]
    pub fn with_app_token(mut self, token: Option<String>) -> Self {
        self.app_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Sets the page size and an optional overall record cap.
    #[must_use]
    pub fn with_paging(mut self, page_size: u64, max_records: Option<u64>) -> Self {
        self.page_size = page_size.max(1);
        self.max_records = max_records;
        self
    }
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    unique_key: Option<String>,
    #[serde(default)]
    created_date: Option<String>,
    #[serde(default)]
    closed_date: Option<String>,
    #[serde(default)]
    complaint_type: Option<String>,
    #[serde(default)]
    incident_zip: Option<String>,
    #[serde(default)]
    borough: Option<String>,
    #[serde(default)]
    latitude: Option<serde_json::Value>,
    #[serde(default)]
    longitude: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    resolution_description: Option<String>,
}

#[async_trait]
impl IncidentSource for Nyc311Source {
    fn id(&self) -> &'static str {
        "nyc_311"
    }

    fn name(&self) -> &'static str {
        "NYC 311 Service Requests"
    }

    async fn fetch(
        &self,
        window: &FetchWindow,
        scope: IncidentScope,
    ) -> Result<Vec<IncidentRecord>, SourceError> {
        let borough_filter = scope.borough().map(|b| b.to_string());
        let equals: Vec<(&str, &str)> = borough_filter
            .as_deref()
            .map(|b| vec![("borough", b)])
            .unwrap_or_default();
        let where_clause = build_where("created_date", window, &equals);

        let raw = fetch_socrata(
            &self.client,
            &SocrataConfig {
                api_url: &self.api_url,
                date_column: "created_date",
                label: "NYC 311",
                page_size: self.page_size,
                max_records: self.max_records,
                app_token: self.app_token.as_deref(),
            },
            &where_clause,
        )
        .await?;

        Ok(normalize(raw))
    }
}

/// Normalizes raw 311 rows. Rows without a `unique_key` or a parseable
/// `created_date` are skipped.
#[must_use]
pub fn normalize(raw: Vec<serde_json::Value>) -> Vec<IncidentRecord> {
    let raw_count = raw.len();
    let mut incidents = Vec::with_capacity(raw_count);

    for value in raw {
        let record: Record = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Skipping malformed 311 row: {e}");
                continue;
            }
        };

        let Some(unique_key) = clean_string(record.unique_key) else {
            log::debug!("Skipping 311 row without unique_key");
            continue;
        };

        let Some(created_at) = record.created_date.as_deref().and_then(parse_socrata_date) else {
            log::debug!("Skipping 311 row {unique_key}: unparseable created_date");
            continue;
        };

        let (latitude, longitude) =
            parse_lat_lng(record.latitude.as_ref(), record.longitude.as_ref());
        let borough = record
            .borough
            .as_deref()
            .map_or(Borough::Unknown, Borough::from_raw);

        incidents.push(
            IncidentRecord::new(
                unique_key,
                created_at,
                clean_string(record.complaint_type).unwrap_or_default(),
                borough,
                clean_string(record.incident_zip).unwrap_or_default(),
            )
            .with_coordinates(latitude, longitude)
            .with_closed_at(record.closed_date.as_deref().and_then(parse_socrata_date))
            .with_resolution(
                clean_string(record.status),
                clean_string(record.resolution_description),
            ),
        );
    }

    log::info!(
        "Normalized {} incidents from {} raw records",
        incidents.len(),
        raw_count
    );
    incidents
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_safety_incident_models::SafetyCategory;
    use serde_json::json;

    #[test]
    fn normalizes_a_complete_row() {
        let raw = vec![json!({
            "unique_key": "59893919",
            "created_date": "2024-01-15T14:30:00.000",
            "closed_date": "2024-01-16T09:00:00.000",
            "complaint_type": " Noise - Residential ",
            "incident_zip": "11211",
            "borough": "BROOKLYN",
            "latitude": "40.7128",
            "longitude": "-73.9573",
            "status": "Closed",
            "resolution_description": "The Police Department responded."
        })];

        let incidents = normalize(raw);
        assert_eq!(incidents.len(), 1);
        let incident = &incidents[0];
        assert_eq!(incident.unique_key, "59893919");
        assert_eq!(incident.incident_type, "Noise - Residential");
        assert_eq!(incident.borough, Borough::Brooklyn);
        assert_eq!(incident.zip_code, "11211");
        assert_eq!(incident.coordinates(), Some((40.7128, -73.9573)));
        assert!(incident.closed_at.is_some());
        assert_eq!(incident.status.as_deref(), Some("Closed"));
        assert_eq!(incident.safety_category(), SafetyCategory::LowConcern);
    }

    #[test]
    fn keeps_rows_with_invalid_coordinates() {
        let raw = vec![json!({
            "unique_key": "1",
            "created_date": "2024-01-15T14:30:00",
            "complaint_type": "Assault",
            "borough": "Unspecified",
            "latitude": "not a number"
        })];

        let incidents = normalize(raw);
        assert_eq!(incidents.len(), 1);
        assert!(incidents[0].coordinates().is_none());
        assert_eq!(incidents[0].borough, Borough::Unknown);
        assert_eq!(incidents[0].zip_code, "");
        assert_eq!(incidents[0].safety_category(), SafetyCategory::HighConcern);
    }

    #[test]
    fn skips_rows_without_key_or_date() {
        let raw = vec![
            json!({ "created_date": "2024-01-15T14:30:00" }),
            json!({ "unique_key": "2", "created_date": "yesterday" }),
            json!({ "unique_key": "3" }),
            json!("not an object"),
        ];
        assert!(normalize(raw).is_empty());
    }

    #[test]
    fn missing_complaint_type_is_infrastructure() {
        let raw = vec![json!({
            "unique_key": "4",
            "created_date": "2024-01-15T14:30:00"
        })];
        let incidents = normalize(raw);
        assert_eq!(incidents[0].incident_type, "");
        assert_eq!(incidents[0].safety_category(), SafetyCategory::Infrastructure);
    }
}
