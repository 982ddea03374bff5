#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the civic safety server.
//!
//! Request bodies are camelCase and also accept the snake_case field names
//! older clients send. Area and route reports are returned as-is from the
//! analysis crates.

use chrono::{DateTime, Utc};
use civic_safety_analysis_models::{AreaQuery, BoroughComparison, BoroughSafety};
use civic_safety_incident_models::{Borough, DataSource};
use serde::{Deserialize, Serialize};

/// Describes how borough scores are computed.
pub const BOROUGH_METHODOLOGY: &str =
    "Complaints categorized by safety severity and weighted scoring";

/// Body of `POST /api/safety`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRequest {
    /// Five-digit postal code.
    #[serde(alias = "zip_code")]
    pub zip_code: Option<String>,
    /// Borough name, case-insensitive.
    pub borough: Option<String>,
    /// Address to geocode.
    pub address: Option<String>,
    /// Radius around `address`, in miles.
    #[serde(alias = "radius_miles")]
    pub radius_miles: Option<f64>,
}

impl From<SafetyRequest> for AreaQuery {
    /// Unrecognized borough names become [`Borough::Unknown`], which query
    /// validation rejects.
    fn from(request: SafetyRequest) -> Self {
        Self {
            zip_code: request.zip_code,
            borough: request.borough.as_deref().map(Borough::from_raw),
            address: request.address,
            radius_miles: request.radius_miles,
        }
    }
}

/// Body of `POST /api/safety/refresh`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Borough to refresh, or every borough when absent.
    pub borough: Option<String>,
}

/// Body of `POST /api/safe-routes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeRoutesRequest {
    /// Origin address.
    pub origin: String,
    /// Destination address.
    pub destination: String,
    /// Travel mode; driving when absent.
    pub mode: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Response of `GET /api/safety/borough-comparison`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiBoroughComparison {
    /// Per-borough ratings.
    pub boroughs: Vec<BoroughSafety>,
    /// How the ratings were computed.
    pub methodology: String,
    /// Provenance of the incident data.
    pub data_source: DataSource,
    /// When the incident data was last fetched successfully.
    pub data_as_of: Option<DateTime<Utc>>,
}

impl From<BoroughComparison> for ApiBoroughComparison {
    fn from(comparison: BoroughComparison) -> Self {
        Self {
            boroughs: comparison.boroughs,
            methodology: BOROUGH_METHODOLOGY.to_string(),
            data_source: comparison.data_source,
            data_as_of: comparison.data_as_of,
        }
    }
}

/// Response of `POST /api/safety/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRefresh {
    /// Whether fresh data was fetched.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
    /// The offending request field, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    /// An error not tied to a request field.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: None,
        }
    }

    /// A validation error on `field`.
    #[must_use]
    pub fn validation(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: Some(field.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_request_accepts_both_casings() {
        let camel: SafetyRequest =
            serde_json::from_str(r#"{"zipCode": "10001", "radiusMiles": 0.25}"#).unwrap();
        let snake: SafetyRequest =
            serde_json::from_str(r#"{"zip_code": "10001", "radius_miles": 0.25}"#).unwrap();
        assert_eq!(camel.zip_code.as_deref(), Some("10001"));
        assert_eq!(snake.zip_code, camel.zip_code);
        assert_eq!(snake.radius_miles, Some(0.25));
    }

    #[test]
    fn borough_names_are_lenient() {
        let query = AreaQuery::from(SafetyRequest {
            borough: Some("staten_island".to_string()),
            ..SafetyRequest::default()
        });
        assert_eq!(query.borough, Some(Borough::StatenIsland));

        let query = AreaQuery::from(SafetyRequest {
            borough: Some("Gotham".to_string()),
            ..SafetyRequest::default()
        });
        assert_eq!(query.borough, Some(Borough::Unknown));
    }

    #[test]
    fn routes_request_mode_is_optional() {
        let req: SafeRoutesRequest =
            serde_json::from_str(r#"{"origin": "a", "destination": "b"}"#).unwrap();
        assert!(req.mode.is_none());
    }

    #[test]
    fn error_omits_missing_field() {
        let json = serde_json::to_value(ApiError::new("boom")).unwrap();
        assert!(json.get("field").is_none());
        let json = serde_json::to_value(ApiError::validation("radius", "too big")).unwrap();
        assert_eq!(json["field"], "radius");
    }
}
