#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route candidate, segment, and route analysis types.
//!
//! The `Directions*` types are the provider-neutral shape of a routing
//! service response. The rest form the JSON contract of a route analysis.

use chrono::{DateTime, Utc};
use civic_safety_analysis_models::{GeoPoint, Grade};
use civic_safety_incident_models::{Borough, DataSource};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How the route is travelled.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TravelMode {
    /// By car.
    #[default]
    Driving,
    /// On foot.
    Walking,
    /// By bicycle.
    Bicycling,
    /// By public transit.
    Transit,
}

/// A distance or duration with its display text (e.g. `{"text": "5 mins",
/// "value": 300}`). Durations are in seconds, distances in meters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    /// Display text.
    pub text: String,
    /// Value in base units.
    pub value: u64,
}

impl Measure {
    /// Creates a measure.
    #[must_use]
    pub fn new(text: impl Into<String>, value: u64) -> Self {
        Self {
            text: text.into(),
            value,
        }
    }
}

/// One step of a routing service route.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsStep {
    /// Where the step starts.
    pub start: GeoPoint,
    /// Where the step ends.
    pub end: GeoPoint,
    /// Step duration.
    pub duration: Measure,
    /// Step distance.
    pub distance: Measure,
}

/// One leg (origin to destination or waypoint) of a routing service route.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsLeg {
    /// Leg duration.
    pub duration: Measure,
    /// Leg distance.
    pub distance: Measure,
    /// Ordered steps.
    pub steps: Vec<DirectionsStep>,
}

/// One candidate route from a routing service.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRoute {
    /// Textual summary (e.g. the main road), if given.
    pub summary: Option<String>,
    /// Ordered legs.
    pub legs: Vec<DirectionsLeg>,
    /// Encoded overview polyline.
    pub polyline: String,
}

/// How a route was classified.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RouteType {
    /// Highest overall safety score.
    Safest,
    /// Shortest duration, when it is not also the safest.
    Fastest,
    /// Neither safest nor fastest, chosen when there are three or more
    /// routes.
    Balanced,
    /// Any other route.
    Unclassified,
}

/// Where a segment's safety score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoreSource {
    /// Scored from the borough's incidents.
    BoroughAggregate,
    /// No incident data for the borough; a fixed per-borough default.
    StaticDefault,
}

/// Coarse area context of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborhoodInfo {
    /// Estimated borough of the segment midpoint.
    pub borough: Borough,
    /// Incidents on record for that borough.
    pub complaint_count: usize,
}

/// One step of a route with its estimated safety.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    /// Where the segment starts.
    pub start_location: GeoPoint,
    /// Where the segment ends.
    pub end_location: GeoPoint,
    /// Segment duration.
    pub duration: Measure,
    /// Segment distance.
    pub distance: Measure,
    /// Estimated safety score.
    pub safety_score: f64,
    /// Grade of `safety_score`.
    pub safety_grade: Grade,
    /// Provenance of `safety_score`.
    pub score_source: ScoreSource,
    /// Area context.
    pub neighborhood_info: NeighborhoodInfo,
}

/// An analyzed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    /// Stable identifier, `route_{index}` in routing service order.
    pub route_id: String,
    /// Textual summary.
    pub summary: String,
    /// Duration over all legs.
    pub total_duration: Measure,
    /// Distance over all legs.
    pub total_distance: Measure,
    /// Distance-weighted mean of segment scores, rounded to two decimals.
    pub overall_safety_score: f64,
    /// Grade of `overall_safety_score`.
    pub overall_safety_grade: Grade,
    /// Human-readable safety description.
    pub safety_description: String,
    /// Ordered segments.
    pub segments: Vec<RouteSegment>,
    /// Encoded overview polyline.
    pub polyline: String,
    /// Classification.
    pub route_type: RouteType,
    /// Safety warnings.
    pub warnings: Vec<String>,
}

/// Which route to take and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// The recommended route, or `None` when there are no routes.
    pub recommended_route_id: Option<String>,
    /// Justification.
    pub reason: String,
}

/// Complete route analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAnalysis {
    /// Requested origin.
    pub origin_address: String,
    /// Requested destination.
    pub destination_address: String,
    /// Travel mode.
    pub mode: TravelMode,
    /// Routes: safest, fastest, and balanced first, then the rest.
    pub routes: Vec<RouteCandidate>,
    /// When the analysis ran.
    pub analysis_timestamp: DateTime<Utc>,
    /// Number of routes in `routes`.
    pub total_routes_analyzed: usize,
    /// The recommendation.
    pub recommendation: Recommendation,
    /// `true` when the routing service returned nothing usable.
    pub no_routes_found: bool,
    /// Provenance of the incident data behind the segment scores, or `None`
    /// when no route was scored.
    pub data_source: Option<DataSource>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn travel_mode_parsing() {
        assert_eq!(TravelMode::default(), TravelMode::Driving);
        assert_eq!(TravelMode::from_str("WALKING").unwrap(), TravelMode::Walking);
        assert_eq!(TravelMode::from_str("transit").unwrap(), TravelMode::Transit);
        assert!(TravelMode::from_str("flying").is_err());
        let mode: &str = TravelMode::Bicycling.as_ref();
        assert_eq!(mode, "bicycling");
    }

    #[test]
    fn route_type_serializes_snake_case() {
        assert_eq!(serde_json::to_value(RouteType::Safest).unwrap(), "safest");
        assert_eq!(
            serde_json::to_value(ScoreSource::StaticDefault).unwrap(),
            "static_default"
        );
    }

    #[test]
    fn empty_recommendation_serializes_null_route() {
        let rec = Recommendation {
            recommended_route_id: None,
            reason: "No routes available".to_string(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json["recommended_route_id"].is_null());
    }
}
