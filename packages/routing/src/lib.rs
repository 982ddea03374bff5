#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route safety analysis.
//!
//! [`RouteAnalyzer`] asks a [`DirectionsProvider`] for alternative routes,
//! scores each step by the borough it passes through
//! ([`segmenter`]), then labels the routes and recommends one
//! ([`categorizer`]).

pub mod categorizer;
pub mod directions;
pub mod segmenter;

use std::str::FromStr as _;
use std::sync::Arc;

use chrono::Utc;
use civic_safety_analysis::AreaAnalyzer;
use civic_safety_routing_models::{RouteAnalysis, RouteCandidate, TravelMode};

pub use directions::{DirectionsProvider, GoogleDirections};
use segmenter::BoroughScores;

/// Errors from a routing service.
#[derive(Debug, thiserror::Error)]
pub enum DirectionsError {
    /// The HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be interpreted.
    #[error("Parse error: {message}")]
    Parse {
        /// What went wrong.
        message: String,
    },

    /// The service answered with a non-OK status.
    #[error("Directions service returned status {status}")]
    Status {
        /// HTTP or API status.
        status: String,
    },
}

/// Errors returned by route analysis.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// The request is malformed.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// The offending input field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Parses a travel mode, defaulting to driving when absent.
///
/// # Errors
///
/// Returns [`RoutingError::Validation`] for an unknown mode.
pub fn parse_mode(mode: Option<&str>) -> Result<TravelMode, RoutingError> {
    match mode.map(str::trim).filter(|m| !m.is_empty()) {
        None => Ok(TravelMode::default()),
        Some(m) => TravelMode::from_str(m).map_err(|_| RoutingError::Validation {
            field: "mode",
            message: format!("'{m}' is not one of driving, walking, bicycling, transit"),
        }),
    }
}

fn require(field: &'static str, value: &str) -> Result<(), RoutingError> {
    if value.trim().is_empty() {
        return Err(RoutingError::Validation {
            field,
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Analyzes candidate routes between two addresses.
pub struct RouteAnalyzer {
    directions: Option<Arc<dyn DirectionsProvider>>,
    areas: Arc<AreaAnalyzer>,
}

impl RouteAnalyzer {
    /// Creates an analyzer. Without a directions provider every analysis
    /// reports no routes.
    #[must_use]
    pub fn new(directions: Option<Arc<dyn DirectionsProvider>>, areas: Arc<AreaAnalyzer>) -> Self {
        if directions.is_none() {
            log::warn!("No directions provider configured; route analysis will find no routes");
        }
        Self { directions, areas }
    }

    /// Fetches, scores, and categorizes routes from `origin` to
    /// `destination`.
    ///
    /// Routing service failures are logged and reported as
    /// `no_routes_found`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Validation`] if the origin or destination is
    /// blank.
    pub async fn analyze_routes(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<RouteAnalysis, RoutingError> {
        require("origin", origin)?;
        require("destination", destination)?;
        let (origin, destination) = (origin.trim(), destination.trim());

        let raw_routes = match &self.directions {
            Some(directions) => match directions.routes(origin, destination, mode).await {
                Ok(routes) => routes,
                Err(e) => {
                    log::error!("Directions request '{origin}' -> '{destination}' failed: {e}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        log::debug!("Routing service returned {} routes", raw_routes.len());

        let (routes, data_source) = if raw_routes.is_empty() {
            (Vec::new(), None)
        } else {
            let scores = BoroughScores::from_comparison(&self.areas.borough_comparison().await);
            let config = self.areas.config();
            let candidates: Vec<RouteCandidate> = raw_routes
                .iter()
                .enumerate()
                .filter_map(|(i, route)| segmenter::analyze_route(route, i, &scores, config))
                .collect();
            (categorizer::categorize(candidates), scores.data_source())
        };

        let recommendation = categorizer::recommend(&routes, &self.areas.config().routes);

        Ok(RouteAnalysis {
            origin_address: origin.to_string(),
            destination_address: destination.to_string(),
            mode,
            total_routes_analyzed: routes.len(),
            no_routes_found: routes.is_empty(),
            routes,
            analysis_timestamp: Utc::now(),
            recommendation,
            data_source,
        })
    }
}
