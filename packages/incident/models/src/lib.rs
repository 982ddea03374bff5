#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Civic incident record, borough, and safety category taxonomy types.
//!
//! Every incident pulled from the city's service-request feed is normalized
//! into an [`IncidentRecord`] and assigned exactly one [`SafetyCategory`] by
//! [`classify`]. The taxonomy is a closed enum: the incident types that
//! belong to each tier are fixed at compile time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the five New York City boroughs, or [`Borough::Unknown`] when the
/// source record has no usable borough (e.g. `"Unspecified"`).
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
#[serde(rename_all = "UPPERCASE")]
#[strum(ascii_case_insensitive)]
pub enum Borough {
    /// Manhattan (New York County)
    #[strum(to_string = "MANHATTAN")]
    Manhattan,
    /// Brooklyn (Kings County)
    #[strum(to_string = "BROOKLYN")]
    Brooklyn,
    /// Queens (Queens County)
    #[strum(to_string = "QUEENS")]
    Queens,
    /// The Bronx (Bronx County)
    #[strum(to_string = "BRONX", serialize = "THE BRONX")]
    Bronx,
    /// Staten Island (Richmond County)
    #[serde(rename = "STATEN ISLAND")]
    #[strum(to_string = "STATEN ISLAND", serialize = "STATEN_ISLAND")]
    StatenIsland,
    /// Missing or unrecognized borough
    #[strum(to_string = "UNKNOWN", serialize = "UNSPECIFIED")]
    Unknown,
}

impl Borough {
    /// Parses a raw borough string from a source record. Anything that is
    /// not one of the five boroughs maps to [`Borough::Unknown`].
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Self::Unknown)
    }

    /// Returns `true` for the five real boroughs.
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Returns the five real boroughs in a stable order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Manhattan,
            Self::Brooklyn,
            Self::Queens,
            Self::Bronx,
            Self::StatenIsland,
        ]
    }
}

/// The slice of incident data a fetch or cache entry covers: one borough or
/// the whole city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IncidentScope {
    /// Every borough.
    All,
    /// A single borough.
    Borough(Borough),
}

impl IncidentScope {
    /// Returns the borough filter, if any.
    #[must_use]
    pub const fn borough(self) -> Option<Borough> {
        match self {
            Self::All => None,
            Self::Borough(b) => Some(b),
        }
    }
}

impl From<Option<Borough>> for IncidentScope {
    fn from(borough: Option<Borough>) -> Self {
        borough.map_or(Self::All, Self::Borough)
    }
}

impl std::fmt::Display for IncidentScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Borough(b) => write!(f, "{b}"),
        }
    }
}

/// Error returned when a string is not a valid [`IncidentScope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidScopeError {
    /// The rejected input.
    pub value: String,
}

impl std::fmt::Display for InvalidScopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid scope '{}': expected \"all\" or a borough name",
            self.value
        )
    }
}

impl std::error::Error for InvalidScopeError {}

impl std::str::FromStr for IncidentScope {
    type Err = InvalidScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match trimmed.parse::<Borough>() {
            Ok(b) if b.is_known() => Ok(Self::Borough(b)),
            _ => Err(InvalidScopeError {
                value: s.to_string(),
            }),
        }
    }
}

/// Where the incident data behind a result came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataSource {
    /// Fetched from the upstream source during this call.
    Live,
    /// Served from a cache entry that is still within its TTL.
    Cached,
    /// The upstream source failed; serving the last good data past its TTL.
    Stale,
    /// The upstream source failed and no earlier data exists; the record set
    /// is empty.
    Fallback,
}

impl DataSource {
    /// Returns `true` when the data did not come from a successful, in-TTL
    /// fetch.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::Stale | Self::Fallback)
    }
}

/// Safety severity tier for an incident type.
///
/// Variants are declared in classification priority order: an incident type
/// is checked against [`SafetyCategory::HighConcern`] first.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyCategory {
    /// Crime and direct threats to personal safety
    HighConcern,
    /// Disorder and quality-of-life issues with some safety impact
    MediumConcern,
    /// Noise, parking, and traffic nuisances
    LowConcern,
    /// Maintenance and infrastructure issues; also the catch-all tier
    Infrastructure,
}

impl SafetyCategory {
    /// Returns every category in classification priority order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::HighConcern,
            Self::MediumConcern,
            Self::LowConcern,
            Self::Infrastructure,
        ]
    }

    /// Severity weight used by the weighted safety score.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::HighConcern => 3.0,
            Self::MediumConcern => 2.0,
            Self::LowConcern => 1.0,
            Self::Infrastructure => 0.5,
        }
    }

    /// Human-readable description of the tier.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::HighConcern => "Serious safety concerns requiring immediate attention",
            Self::MediumConcern => "Moderate safety and quality-of-life concerns",
            Self::LowConcern => "Minor quality-of-life issues with minimal safety impact",
            Self::Infrastructure => "Infrastructure and maintenance issues",
        }
    }

    /// The exact (case-sensitive) incident type strings that belong to this
    /// tier.
    #[must_use]
    pub const fn incident_types(self) -> &'static [&'static str] {
        match self {
            Self::HighConcern => &[
                "Drug Activity",
                "Non-Emergency Police Matter",
                "Criminal Mischief",
                "Harassment",
                "Assault",
                "Robbery",
                "Burglary",
                "Theft",
                "Vandalism",
                "Weapon",
            ],
            Self::MediumConcern => &[
                "Panhandling",
                "Homeless Person Assistance",
                "Abandoned Vehicle",
                "Illegal Fireworks",
                "Illegal Dumping",
                "Public Urination",
                "Disorderly Conduct",
            ],
            Self::LowConcern => &[
                "Noise - Residential",
                "Noise - Street/Sidewalk",
                "Noise - Commercial",
                "Noise - Vehicle",
                "Noise - Helicopter",
                "Noise - Park",
                "Noise",
                "Illegal Parking",
                "Blocked Driveway",
                "Traffic",
                "For Hire Vehicle Complaint",
                "Taxi Complaint",
            ],
            Self::Infrastructure => &[
                "Street Condition",
                "Sidewalk Condition",
                "Traffic Signal Condition",
                "Street Light Condition",
                "Street Sign - Damaged",
                "Damaged Tree",
                "Water System",
                "Sewer",
                "Standing Water",
                "Dirty Condition",
                "Rodent",
                "Maintenance or Facility",
                "Residential Disposal Complaint",
            ],
        }
    }
}

/// Assigns a [`SafetyCategory`] to a raw incident type.
///
/// Matching is exact and case-sensitive, tried in priority order; the first
/// tier that lists the type wins. Missing, empty, and unrecognized types
/// resolve to [`SafetyCategory::Infrastructure`].
#[must_use]
pub fn classify(incident_type: Option<&str>) -> SafetyCategory {
    let Some(incident_type) = incident_type.filter(|t| !t.is_empty()) else {
        return SafetyCategory::Infrastructure;
    };

    SafetyCategory::all()
        .iter()
        .copied()
        .find(|category| category.incident_types().contains(&incident_type))
        .unwrap_or(SafetyCategory::Infrastructure)
}

/// A civic incident report normalized to the canonical schema.
///
/// The safety category and weight are derived once in
/// [`IncidentRecord::new`] and cannot be changed afterwards. Records are
/// shared read-only once they enter the incident store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Source identifier (`unique_key`).
    pub unique_key: String,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// When the report was closed, if it has been.
    pub closed_at: Option<DateTime<Utc>>,
    /// Raw incident type (`complaint_type`), trimmed.
    pub incident_type: String,
    /// Borough the incident was reported in.
    pub borough: Borough,
    /// Postal code (`incident_zip`), trimmed. Empty when missing.
    pub zip_code: String,
    /// Latitude (WGS84). `None` when missing or invalid.
    pub latitude: Option<f64>,
    /// Longitude (WGS84). `None` when missing or invalid.
    pub longitude: Option<f64>,
    /// Request status (e.g. `"Closed"`).
    pub status: Option<String>,
    /// Agency resolution text.
    pub resolution_description: Option<String>,
    safety_category: SafetyCategory,
    safety_weight: f64,
}

impl IncidentRecord {
    /// Creates a record and classifies its incident type.
    #[must_use]
    pub fn new(
        unique_key: impl Into<String>,
        created_at: DateTime<Utc>,
        incident_type: impl Into<String>,
        borough: Borough,
        zip_code: impl Into<String>,
    ) -> Self {
        let incident_type = incident_type.into();
        let safety_category = classify(Some(&incident_type));

        Self {
            unique_key: unique_key.into(),
            created_at,
            closed_at: None,
            incident_type,
            borough,
            zip_code: zip_code.into(),
            latitude: None,
            longitude: None,
            status: None,
            resolution_description: None,
            safety_category,
            safety_weight: safety_category.weight(),
        }
    }

    /// Sets the coordinates. Non-finite values are dropped.
    #[must_use]
    pub fn with_coordinates(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        self.latitude = latitude.filter(|v| v.is_finite());
        self.longitude = longitude.filter(|v| v.is_finite());
        self
    }

    /// Sets the close timestamp.
    #[must_use]
    pub fn with_closed_at(mut self, closed_at: Option<DateTime<Utc>>) -> Self {
        self.closed_at = closed_at;
        self
    }

    /// Sets the status and resolution text.
    #[must_use]
    pub fn with_resolution(
        mut self,
        status: Option<String>,
        resolution_description: Option<String>,
    ) -> Self {
        self.status = status;
        self.resolution_description = resolution_description;
        self
    }

    /// The category assigned at creation.
    #[must_use]
    pub const fn safety_category(&self) -> SafetyCategory {
        self.safety_category
    }

    /// The category weight copied at creation.
    #[must_use]
    pub const fn safety_weight(&self) -> f64 {
        self.safety_weight
    }

    /// Returns `(latitude, longitude)` when both are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}
