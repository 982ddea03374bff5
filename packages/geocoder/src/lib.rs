#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for free-text address queries.
//!
//! Converts an address to a single best latitude/longitude using a
//! multi-provider strategy configured via TOML files in `services/`:
//!
//! 1. **Google Maps Geocoding API** (priority 1), only when an API key is
//!    configured.
//! 2. **Nominatim / OpenStreetMap** (priority 2), free, 1 req/sec rate
//!    limit.
//!
//! Providers are loaded from the [`service_registry`] and tried in priority
//! order by [`GeocoderChain`]. A provider error is logged and the next
//! provider is tried; callers only see "no geocode available" when every
//! provider fails or finds nothing.

pub mod google;
pub mod nominatim;
pub mod service_registry;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::google::GoogleGeocoder;
use crate::nominatim::NominatimGeocoder;
use crate::service_registry::{ProviderConfig, enabled_services};

/// A geocoding result.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPoint {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the geocoder.
    pub matched_address: Option<String>,
    /// Which provider resolved this address.
    pub provider: GeocodingProvider,
}

/// Which geocoding provider resolved an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocodingProvider {
    /// Google Maps Geocoding API.
    Google,
    /// Nominatim / OpenStreetMap.
    Nominatim,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The provider answered with a non-OK status string.
    #[error("Geocoder returned status {status}")]
    Status {
        /// The status reported by the provider (e.g., `"REQUEST_DENIED"`).
        status: String,
    },

    /// An embedded service configuration could not be parsed.
    #[error("Invalid geocoding service config '{id}': {message}")]
    Config {
        /// Service file identifier.
        id: String,
        /// Parser message.
        message: String,
    },
}

/// Resolves a free-text address to a single best point.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocodes `address`.
    ///
    /// Returns `Ok(None)` when the provider found no match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails or the provider reports
    /// a non-OK status.
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedPoint>, GeocodeError>;
}

/// Tries a list of geocoders in order and returns the first match.
#[derive(Default, Clone)]
pub struct GeocoderChain {
    providers: Vec<Arc<dyn Geocoder>>,
}

impl GeocoderChain {
    /// Creates a chain from explicit providers.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn Geocoder>>) -> Self {
        Self { providers }
    }

    /// Builds the chain from the enabled services in the registry.
    ///
    /// Google is skipped when `google_api_key` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if a service config is malformed or an HTTP
    /// client cannot be built.
    pub fn from_registry(google_api_key: Option<&str>) -> Result<Self, GeocodeError> {
        let mut providers: Vec<Arc<dyn Geocoder>> = Vec::new();

        for service in enabled_services()? {
            match &service.provider {
                ProviderConfig::Google {
                    base_url,
                    timeout_secs,
                } => {
                    let Some(key) = google_api_key.filter(|k| !k.is_empty()) else {
                        log::info!("Skipping {}: no API key configured", service.name);
                        continue;
                    };
                    providers.push(Arc::new(GoogleGeocoder::new(
                        base_url,
                        key,
                        std::time::Duration::from_secs(*timeout_secs),
                    )?));
                }
                ProviderConfig::Nominatim {
                    base_url,
                    rate_limit_ms,
                    timeout_secs,
                    country_codes,
                } => {
                    providers.push(Arc::new(NominatimGeocoder::new(
                        base_url,
                        country_codes,
                        std::time::Duration::from_millis(*rate_limit_ms),
                        std::time::Duration::from_secs(*timeout_secs),
                    )?));
                }
            }
            log::debug!("Enabled geocoding service {}", service.id);
        }

        Ok(Self { providers })
    }

    /// Number of configured providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if no provider is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl Geocoder for GeocoderChain {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedPoint>, GeocodeError> {
        let query = normalize_query(address);
        if query.is_empty() {
            return Ok(None);
        }

        let mut last_error = None;
        for provider in &self.providers {
            match provider.geocode(&query).await {
                Ok(Some(point)) => return Ok(Some(point)),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Geocoding failed for '{query}': {e}");
                    last_error = Some(e);
                }
            }
        }

        last_error.map_or(Ok(None), Err)
    }
}

/// Trims and collapses internal whitespace.
#[must_use]
pub fn normalize_query(address: &str) -> String {
    address.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Option<GeocodedPoint>, &'static str>);

    #[async_trait]
    impl Geocoder for Fixed {
        async fn geocode(&self, _address: &str) -> Result<Option<GeocodedPoint>, GeocodeError> {
            match &self.0 {
                Ok(point) => Ok(point.clone()),
                Err(status) => Err(GeocodeError::Status {
                    status: (*status).to_string(),
                }),
            }
        }
    }

    fn point(latitude: f64) -> GeocodedPoint {
        GeocodedPoint {
            latitude,
            longitude: -73.98,
            matched_address: None,
            provider: GeocodingProvider::Nominatim,
        }
    }

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(
            normalize_query("  350   5th Ave,\tNew York "),
            "350 5th Ave, New York"
        );
    }

    #[tokio::test]
    async fn chain_falls_through_errors_and_misses() {
        let chain = GeocoderChain::new(vec![
            Arc::new(Fixed(Err("REQUEST_DENIED"))),
            Arc::new(Fixed(Ok(None))),
            Arc::new(Fixed(Ok(Some(point(40.75))))),
        ]);
        let result = chain.geocode("350 5th Ave").await.unwrap();
        assert_eq!(result, Some(point(40.75)));
    }

    #[tokio::test]
    async fn chain_reports_last_error_when_nothing_matches() {
        let chain = GeocoderChain::new(vec![
            Arc::new(Fixed(Ok(None))),
            Arc::new(Fixed(Err("OVER_QUERY_LIMIT"))),
        ]);
        let err = chain.geocode("350 5th Ave").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Status { status } if status == "OVER_QUERY_LIMIT"));
    }

    #[tokio::test]
    async fn blank_query_is_not_sent() {
        let chain = GeocoderChain::new(vec![Arc::new(Fixed(Ok(Some(point(40.0)))))]);
        assert!(chain.geocode("   ").await.unwrap().is_none());
    }

    #[test]
    fn registry_without_key_only_builds_nominatim() {
        let chain = GeocoderChain::from_registry(None).unwrap();
        assert_eq!(chain.len(), 1);
        let chain = GeocoderChain::from_registry(Some("key")).unwrap();
        assert_eq!(chain.len(), 2);
    }
}
