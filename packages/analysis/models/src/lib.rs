#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area query, safety rating, and area report types.
//!
//! These types form the JSON contract of an area safety rating. Field
//! names are snake case on the wire.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use civic_safety_incident_models::{Borough, DataSource, SafetyCategory};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        Self::new(point.longitude, point.latitude)
    }
}

/// Which area a rating is requested for.
///
/// Any combination of criteria may be set. An address takes precedence
/// when it geocodes; otherwise the postal code and borough filters apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaQuery {
    /// Five-digit postal code.
    pub zip_code: Option<String>,
    /// Borough.
    pub borough: Option<Borough>,
    /// Free-text address to geocode.
    pub address: Option<String>,
    /// Radius around the geocoded address, in miles. `None` uses the
    /// configured default.
    pub radius_miles: Option<f64>,
}

impl AreaQuery {
    /// Query for a postal code.
    #[must_use]
    pub fn zip_code(zip_code: impl Into<String>) -> Self {
        Self {
            zip_code: Some(zip_code.into()),
            ..Self::empty()
        }
    }

    /// Query for a borough.
    #[must_use]
    pub fn borough(borough: Borough) -> Self {
        Self {
            borough: Some(borough),
            ..Self::empty()
        }
    }

    /// Query for a radius around an address.
    #[must_use]
    pub fn address(address: impl Into<String>, radius_miles: Option<f64>) -> Self {
        Self {
            address: Some(address.into()),
            radius_miles,
            ..Self::empty()
        }
    }

    /// Adds a borough filter.
    #[must_use]
    pub fn with_borough(mut self, borough: Borough) -> Self {
        self.borough = Some(borough);
        self
    }

    /// Adds a postal code filter.
    #[must_use]
    pub fn with_zip_code(mut self, zip_code: impl Into<String>) -> Self {
        self.zip_code = Some(zip_code.into());
        self
    }

    const fn empty() -> Self {
        Self {
            zip_code: None,
            borough: None,
            address: None,
            radius_miles: None,
        }
    }

    /// Returns `true` if no criterion is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.zip_code.is_none() && self.borough.is_none() && self.address.is_none()
    }
}

/// Letter grade for a safety score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Grade {
    /// Very safe.
    A,
    /// Generally safe.
    B,
    /// Moderately safe.
    C,
    /// Some safety concerns.
    D,
    /// Significant safety concerns.
    F,
}

impl Grade {
    /// Human-readable description of the grade.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::A => "Very Safe",
            Self::B => "Generally Safe",
            Self::C => "Moderately Safe",
            Self::D => "Some Safety Concerns",
            Self::F => "Significant Safety Concerns",
        }
    }

    /// UI color tag for the grade.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::A => "green",
            Self::B => "lightgreen",
            Self::C => "yellow",
            Self::D => "orange",
            Self::F => "red",
        }
    }
}

/// A score on the 1.0 (least safe) to 5.0 (safest) scale with its grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRating {
    /// Score in `[1.0, 5.0]`, rounded to two decimals.
    pub score: f64,
    /// Letter grade.
    pub grade: Grade,
    /// Human-readable description.
    pub description: String,
    /// UI color tag.
    pub color: String,
}

impl SafetyRating {
    /// Builds a rating with the grade's own description and color.
    #[must_use]
    pub fn graded(score: f64, grade: Grade) -> Self {
        Self {
            score,
            grade,
            description: grade.description().to_string(),
            color: grade.color().to_string(),
        }
    }

    /// The neutral rating used when there is not enough data.
    #[must_use]
    pub fn insufficient_data() -> Self {
        Self {
            score: 3.0,
            grade: Grade::C,
            description: "Insufficient Data".to_string(),
            color: "gray".to_string(),
        }
    }
}

/// Aggregate metrics over a set of incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyMetrics {
    /// Number of incidents.
    pub total_complaints: usize,
    /// Mean incident weight mapped onto the 1–5 scale, before the
    /// concern and activity adjustments. Rounded to two decimals.
    pub weighted_safety_score: f64,
    /// Mean safety weight of the incidents.
    pub average_weight: f64,
    /// Incidents per day across the observed date span. Rounded to three
    /// decimals.
    pub complaints_per_day: f64,
    /// Fraction of incidents in the high-concern tier. Rounded to three
    /// decimals.
    pub high_concern_ratio: f64,
    /// Fraction of incidents per category.
    pub category_distribution: BTreeMap<SafetyCategory, f64>,
}

impl SafetyMetrics {
    /// Metrics for an empty incident set with the given base score.
    #[must_use]
    pub const fn empty(weighted_safety_score: f64) -> Self {
        Self {
            total_complaints: 0,
            weighted_safety_score,
            average_weight: 0.0,
            complaints_per_day: 0.0,
            high_concern_ratio: 0.0,
            category_distribution: BTreeMap::new(),
        }
    }
}

/// How often an incident type occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentTypeCount {
    /// The raw incident type.
    pub incident_type: String,
    /// Occurrences.
    pub count: usize,
}

/// Per-category slice of a complaint breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// Incidents in the category.
    pub count: usize,
    /// Share of all incidents, 0–100.
    pub percentage: f64,
    /// Category description.
    pub description: String,
    /// Most frequent incident types in the category.
    pub top_complaints: Vec<IncidentTypeCount>,
}

/// Direction of recent activity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trend {
    /// More than 20% above the previous window.
    Increasing,
    /// More than 20% below the previous window.
    Decreasing,
    /// Neither, or no previous-window history.
    Stable,
}

/// Recent-versus-previous window comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    /// Incidents in the most recent window.
    pub recent_complaints: usize,
    /// Incidents in the window immediately before.
    pub previous_period_complaints: usize,
    /// Trend label.
    pub trend: Trend,
    /// Window length in days.
    pub days_analyzed: u32,
}

/// How the incident subset behind a report was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilterMode {
    /// Haversine radius around a geocoded address.
    Radius,
    /// Postal code match.
    ZipCode,
    /// Borough match.
    Borough,
    /// Postal code and borough both matched.
    ZipCodeAndBorough,
    /// An address was given but could not be geocoded and there was no
    /// other criterion to fall back to.
    Unresolved,
}

/// The area a report describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaInfo {
    /// Requested postal code.
    pub zip_code: Option<String>,
    /// Requested borough.
    pub borough: Option<Borough>,
    /// Requested address.
    pub address: Option<String>,
    /// Radius used for address queries.
    pub radius_miles: f64,
    /// Incidents in the selected subset.
    pub data_points: usize,
    /// Geocoded address location, when the address resolved.
    pub location: Option<GeoPoint>,
    /// How the subset was selected.
    pub filter_mode: FilterMode,
}

/// Complete area safety rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSafetyReport {
    /// The area described.
    pub area_info: AreaInfo,
    /// Final rating.
    pub safety_rating: SafetyRating,
    /// Underlying metrics.
    pub safety_metrics: SafetyMetrics,
    /// Human-readable summary.
    pub safety_summary: String,
    /// Per-category breakdown, in category priority order.
    pub complaint_breakdown: BTreeMap<SafetyCategory, CategoryBreakdown>,
    /// Recent-activity trend.
    pub recent_activity: RecentActivity,
    /// Safety recommendations.
    pub recommendations: Vec<String>,
    /// `true` when the rating is the neutral insufficient-data default.
    pub insufficient_data: bool,
    /// Provenance of the incident data.
    pub data_source: DataSource,
    /// When the incident data was last fetched successfully.
    pub data_as_of: Option<DateTime<Utc>>,
}

/// One borough's aggregate rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoroughSafety {
    /// The borough.
    pub borough: Borough,
    /// Final score.
    pub safety_score: f64,
    /// Letter grade.
    pub grade: Grade,
    /// Incidents in the borough.
    pub total_complaints: usize,
    /// Fraction of high-concern incidents.
    pub high_concern_ratio: f64,
}

/// Ratings for every borough present in the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoroughComparison {
    /// Per-borough ratings in [`Borough::all`] order. Boroughs without
    /// incidents are omitted.
    pub boroughs: Vec<BoroughSafety>,
    /// Provenance of the incident data.
    pub data_source: DataSource,
    /// When the incident data was last fetched successfully.
    pub data_as_of: Option<DateTime<Utc>>,
}

impl BoroughComparison {
    /// Looks up one borough.
    #[must_use]
    pub fn get(&self, borough: Borough) -> Option<&BoroughSafety> {
        self.boroughs.iter().find(|b| b.borough == borough)
    }
}
