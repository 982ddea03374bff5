//! Area ratings and the borough comparison.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use civic_safety_analysis_models::{
    AreaInfo, AreaQuery, AreaSafetyReport, BoroughComparison, BoroughSafety, FilterMode, GeoPoint,
    RecentActivity, SafetyMetrics, SafetyRating, Trend,
};
use civic_safety_geocoder::Geocoder;
use civic_safety_incident_models::{Borough, DataSource, IncidentRecord, IncidentScope};
use civic_safety_store::{IncidentSnapshot, IncidentStore};

use crate::config::ScoringConfig;
use crate::{AnalysisError, geo_filter, scorer, summary, trend};

/// Rates areas against the incident store.
pub struct AreaAnalyzer {
    store: Arc<IncidentStore>,
    geocoder: Arc<dyn Geocoder>,
    config: ScoringConfig,
}

impl AreaAnalyzer {
    /// Creates an analyzer.
    #[must_use]
    pub fn new(
        store: Arc<IncidentStore>,
        geocoder: Arc<dyn Geocoder>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            store,
            geocoder,
            config,
        }
    }

    /// The scoring calibration in use.
    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// The backing incident store.
    #[must_use]
    pub const fn store(&self) -> &Arc<IncidentStore> {
        &self.store
    }

    /// Rates an area as of now.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Validation`] if the query is malformed.
    /// Upstream failures are reported in the result, not as errors.
    pub async fn rate_area(&self, query: &AreaQuery) -> Result<AreaSafetyReport, AnalysisError> {
        self.rate_area_at(query, Utc::now()).await
    }

    /// Rates an area with the trend windows ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Validation`] if the query is malformed.
    pub async fn rate_area_at(
        &self,
        query: &AreaQuery,
        now: DateTime<Utc>,
    ) -> Result<AreaSafetyReport, AnalysisError> {
        validate_query(query, &self.config)?;
        let radius = query
            .radius_miles
            .unwrap_or(self.config.area.default_radius_miles);

        let location = match query.address.as_deref() {
            Some(address) => self.locate(address).await,
            None => None,
        };

        // A borough-only query can be served from the narrower borough scope.
        let scope = match (location, query.borough) {
            (None, Some(borough)) => IncidentScope::Borough(borough),
            _ => IncidentScope::All,
        };
        let snapshot = self.store.snapshot(scope).await;

        let (subset, filter_mode) = geo_filter::filter(&snapshot.records, query, location, radius);
        let area_info = AreaInfo {
            zip_code: query.zip_code.clone(),
            borough: query.borough,
            address: query.address.clone(),
            radius_miles: radius,
            data_points: subset.len(),
            location,
            filter_mode,
        };

        if filter_mode == FilterMode::Unresolved {
            log::warn!("Could not resolve area for {query:?}; returning default rating");
            return Ok(self.insufficient_data(
                AreaInfo {
                    data_points: 0,
                    ..area_info
                },
                "Unable to locate the requested address",
                &snapshot,
            ));
        }

        if subset.is_empty() {
            let message = if snapshot.data_source == DataSource::Fallback {
                "Incident data is temporarily unavailable for this area"
            } else {
                "No incident data available for this area"
            };
            return Ok(self.insufficient_data(area_info, message, &snapshot));
        }

        let outcome = scorer::score(&subset, &self.config);
        log::info!(
            "Rated area ({filter_mode}, {} incidents): {} ({})",
            subset.len(),
            outcome.rating.score,
            outcome.rating.grade
        );

        Ok(AreaSafetyReport {
            area_info,
            safety_summary: summary::safety_summary(&subset, &outcome.metrics, &outcome.rating),
            complaint_breakdown: summary::complaint_breakdown(&subset),
            recent_activity: trend::trend(&subset, now, &self.config.trend),
            recommendations: summary::recommendations(&outcome.rating, &outcome.metrics),
            safety_rating: outcome.rating,
            safety_metrics: outcome.metrics,
            insufficient_data: false,
            data_source: snapshot.data_source,
            data_as_of: snapshot.data_as_of,
        })
    }

    /// Rates every borough present in the city-wide data set. Records with
    /// an unknown borough are excluded.
    pub async fn borough_comparison(&self) -> BoroughComparison {
        let snapshot = self.store.snapshot(IncidentScope::All).await;
        let boroughs = borough_ratings(&snapshot.records, &self.config);
        log::debug!("Compared {} boroughs", boroughs.len());
        BoroughComparison {
            boroughs,
            data_source: snapshot.data_source,
            data_as_of: snapshot.data_as_of,
        }
    }

    async fn locate(&self, address: &str) -> Option<GeoPoint> {
        match self.geocoder.geocode(address).await {
            Ok(Some(point)) => {
                log::debug!(
                    "Geocoded '{address}' to ({}, {})",
                    point.latitude,
                    point.longitude
                );
                Some(GeoPoint::new(point.latitude, point.longitude))
            }
            Ok(None) => {
                log::warn!("No geocoding match for '{address}'");
                None
            }
            Err(e) => {
                log::warn!("Geocoding failed for '{address}': {e}");
                None
            }
        }
    }

    fn insufficient_data(
        &self,
        area_info: AreaInfo,
        message: &str,
        snapshot: &IncidentSnapshot,
    ) -> AreaSafetyReport {
        let neutral = SafetyRating::insufficient_data();
        AreaSafetyReport {
            area_info,
            safety_metrics: SafetyMetrics::empty(neutral.score),
            safety_rating: neutral,
            safety_summary: message.to_string(),
            complaint_breakdown: std::collections::BTreeMap::new(),
            recent_activity: RecentActivity {
                recent_complaints: 0,
                previous_period_complaints: 0,
                trend: Trend::Stable,
                days_analyzed: self.config.trend.window_days,
            },
            recommendations: summary::insufficient_data_recommendations(),
            insufficient_data: true,
            data_source: snapshot.data_source,
            data_as_of: snapshot.data_as_of,
        }
    }
}

/// Scores each known borough over `records`.
#[must_use]
pub fn borough_ratings(records: &[IncidentRecord], config: &ScoringConfig) -> Vec<BoroughSafety> {
    Borough::all()
        .iter()
        .filter_map(|&borough| {
            let subset: Vec<&IncidentRecord> =
                records.iter().filter(|r| r.borough == borough).collect();
            if subset.is_empty() {
                return None;
            }
            let outcome = scorer::score(&subset, config);
            Some(BoroughSafety {
                borough,
                safety_score: outcome.rating.score,
                grade: outcome.rating.grade,
                total_complaints: outcome.metrics.total_complaints,
                high_concern_ratio: outcome.metrics.high_concern_ratio,
            })
        })
        .collect()
}

/// Checks a query for malformed input.
///
/// # Errors
///
/// Returns [`AnalysisError::Validation`] naming the first bad field.
pub fn validate_query(query: &AreaQuery, config: &ScoringConfig) -> Result<(), AnalysisError> {
    if query.is_empty() {
        return Err(AnalysisError::validation(
            "query",
            "at least one location parameter (address, zip_code, or borough) is required",
        ));
    }

    if let Some(address) = &query.address
        && address.trim().is_empty()
    {
        return Err(AnalysisError::validation("address", "must not be blank"));
    }

    if let Some(zip) = &query.zip_code {
        let zip = zip.trim();
        if zip.len() != 5 || !zip.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AnalysisError::validation(
                "zip_code",
                format!("'{zip}' is not a 5-digit postal code"),
            ));
        }
    }

    if query.borough == Some(Borough::Unknown) {
        return Err(AnalysisError::validation(
            "borough",
            "must be one of MANHATTAN, BROOKLYN, QUEENS, BRONX, STATEN ISLAND",
        ));
    }

    if let Some(radius) = query.radius_miles {
        let max = config.area.max_radius_miles;
        if !radius.is_finite() || radius <= 0.0 || radius > max {
            return Err(AnalysisError::validation(
                "radius_miles",
                format!("must be greater than 0 and at most {max}"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use civic_safety_analysis_models::Grade;
    use civic_safety_geocoder::{GeocodeError, GeocodedPoint, GeocodingProvider};
    use civic_safety_source::{FetchWindow, IncidentSource, SourceError};
    use civic_safety_store::StoreConfig;

    use super::*;

    struct FakeSource {
        records: Vec<IncidentRecord>,
        failing: AtomicBool,
    }

    #[async_trait]
    impl IncidentSource for FakeSource {
        fn id(&self) -> &'static str {
            "fake"
        }

        fn name(&self) -> &'static str {
            "Fake"
        }

        async fn fetch(
            &self,
            _window: &FetchWindow,
            scope: IncidentScope,
        ) -> Result<Vec<IncidentRecord>, SourceError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(SourceError::Status { status: 503 });
            }
            Ok(self
                .records
                .iter()
                .filter(|r| scope.borough().is_none_or(|b| r.borough == b))
                .cloned()
                .collect())
        }
    }

    /// Resolves one known address; everything else misses.
    struct FakeGeocoder;

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, address: &str) -> Result<Option<GeocodedPoint>, GeocodeError> {
            match address {
                "350 5th Ave" => Ok(Some(GeocodedPoint {
                    latitude: 40.7484,
                    longitude: -73.9857,
                    matched_address: None,
                    provider: GeocodingProvider::Google,
                })),
                "denied" => Err(GeocodeError::Status {
                    status: "REQUEST_DENIED".to_string(),
                }),
                _ => Ok(None),
            }
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn record(
        key: &str,
        incident_type: &str,
        borough: Borough,
        zip: &str,
        coords: (f64, f64),
        days_ago: i64,
    ) -> IncidentRecord {
        IncidentRecord::new(key, now() - Duration::days(days_ago), incident_type, borough, zip)
            .with_coordinates(Some(coords.0), Some(coords.1))
    }

    fn fixtures() -> Vec<IncidentRecord> {
        vec![
            record("1", "Assault", Borough::Manhattan, "10001", (40.7484, -73.9843), 2),
            record("2", "Noise", Borough::Manhattan, "10001", (40.7490, -73.9850), 5),
            record(
                "3",
                "Noise - Residential",
                Borough::Manhattan,
                "10001",
                (40.7480, -73.9860),
                40,
            ),
            record("4", "Rodent", Borough::Manhattan, "10036", (40.7580, -73.9855), 10),
            record("5", "Illegal Parking", Borough::Brooklyn, "11201", (40.6928, -73.9903), 3),
            record("6", "Street Condition", Borough::Queens, "11101", (40.7447, -73.9485), 50),
            record("7", "Noise", Borough::Unknown, "", (40.70, -73.95), 1),
        ]
    }

    fn analyzer(failing: bool) -> AreaAnalyzer {
        let source = Arc::new(FakeSource {
            records: fixtures(),
            failing: AtomicBool::new(failing),
        });
        let store = Arc::new(IncidentStore::new(source, StoreConfig::default()));
        AreaAnalyzer::new(store, Arc::new(FakeGeocoder), ScoringConfig::default())
    }

    #[tokio::test]
    async fn zip_code_rating() {
        let report = analyzer(false)
            .rate_area_at(&AreaQuery::zip_code("10001"), now())
            .await
            .unwrap();

        assert_eq!(report.area_info.filter_mode, FilterMode::ZipCode);
        assert_eq!(report.area_info.data_points, 3);
        assert_eq!(report.safety_metrics.total_complaints, 3);
        assert!(!report.insufficient_data);
        assert_eq!(report.data_source, DataSource::Live);
        assert_eq!(report.recent_activity.recent_complaints, 2);
        assert_eq!(report.recent_activity.previous_period_complaints, 1);
        assert!(report.safety_summary.starts_with("This area is rated as "));
        assert!(
            report
                .complaint_breakdown
                .contains_key(&civic_safety_incident_models::SafetyCategory::HighConcern)
        );
    }

    #[tokio::test]
    async fn address_rating_uses_radius() {
        let query = AreaQuery::address("350 5th Ave", Some(0.25)).with_borough(Borough::Brooklyn);
        let report = analyzer(false).rate_area_at(&query, now()).await.unwrap();

        assert_eq!(report.area_info.filter_mode, FilterMode::Radius);
        assert_eq!(report.area_info.data_points, 3);
        assert!(report.area_info.location.is_some());
        assert!((report.area_info.radius_miles - 0.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unresolved_address_falls_back_to_borough() {
        let query = AreaQuery::address("denied", None).with_borough(Borough::Brooklyn);
        let report = analyzer(false).rate_area_at(&query, now()).await.unwrap();

        assert_eq!(report.area_info.filter_mode, FilterMode::Borough);
        assert_eq!(report.area_info.data_points, 1);
        assert!((report.area_info.radius_miles - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unresolved_address_alone_is_insufficient_data() {
        let report = analyzer(false)
            .rate_area_at(&AreaQuery::address("nowhere at all", None), now())
            .await
            .unwrap();

        assert!(report.insufficient_data);
        assert_eq!(report.area_info.filter_mode, FilterMode::Unresolved);
        assert_eq!(report.area_info.data_points, 0);
        assert_eq!(report.safety_rating.grade, Grade::C);
        assert_eq!(report.safety_rating.description, "Insufficient Data");
        assert_eq!(report.recommendations.len(), 3);
    }

    #[tokio::test]
    async fn empty_match_is_insufficient_data() {
        let report = analyzer(false)
            .rate_area_at(&AreaQuery::zip_code("10314"), now())
            .await
            .unwrap();

        assert!(report.insufficient_data);
        assert!((report.safety_rating.score - 3.0).abs() < 1e-9);
        assert!((report.safety_metrics.weighted_safety_score - 3.0).abs() < 1e-9);
        assert_eq!(report.safety_summary, "No incident data available for this area");
    }

    #[tokio::test]
    async fn upstream_outage_yields_flagged_default() {
        let report = analyzer(true)
            .rate_area_at(&AreaQuery::borough(Borough::Brooklyn), now())
            .await
            .unwrap();

        assert!(report.insufficient_data);
        assert_eq!(report.data_source, DataSource::Fallback);
        assert!(report.data_as_of.is_none());
        assert_eq!(report.safety_rating.color, "gray");
    }

    #[tokio::test]
    async fn borough_comparison_skips_unknown() {
        let comparison = analyzer(false).borough_comparison().await;
        let boroughs: Vec<Borough> = comparison.boroughs.iter().map(|b| b.borough).collect();

        assert_eq!(boroughs, [Borough::Manhattan, Borough::Brooklyn, Borough::Queens]);
        assert_eq!(comparison.get(Borough::Manhattan).unwrap().total_complaints, 4);
        assert!(comparison.get(Borough::Bronx).is_none());
    }

    #[test]
    fn validation_rules() {
        let config = ScoringConfig::default();
        let field = |query: &AreaQuery| match validate_query(query, &config) {
            Err(AnalysisError::Validation { field, .. }) => Some(field),
            _ => None,
        };

        assert_eq!(field(&AreaQuery::zip_code("10001")), None);
        assert_eq!(field(&AreaQuery::borough(Borough::Bronx)), None);
        assert_eq!(
            field(&AreaQuery {
                zip_code: None,
                borough: None,
                address: None,
                radius_miles: Some(1.0),
            }),
            Some("query")
        );
        assert_eq!(field(&AreaQuery::address("   ", None)), Some("address"));
        assert_eq!(field(&AreaQuery::zip_code("1000")), Some("zip_code"));
        assert_eq!(field(&AreaQuery::zip_code("1000A")), Some("zip_code"));
        assert_eq!(field(&AreaQuery::borough(Borough::Unknown)), Some("borough"));
        assert_eq!(field(&AreaQuery::address("x", Some(0.0))), Some("radius_miles"));
        assert_eq!(field(&AreaQuery::address("x", Some(f64::NAN))), Some("radius_miles"));
        assert_eq!(field(&AreaQuery::address("x", Some(10.5))), Some("radius_miles"));
        assert_eq!(field(&AreaQuery::address("x", Some(10.0))), None);
    }
}
