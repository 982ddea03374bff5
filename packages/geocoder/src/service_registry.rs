//! Compile-time registry of geocoding service configurations.
//!
//! Each geocoding provider is defined in a TOML file under `services/`.
//! The registry embeds these at compile time and exposes them via
//! [`all_services`] and [`enabled_services`].

use serde::Deserialize;

use crate::GeocodeError;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"google"`, `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service is active in the geocoding chain.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Execution order, lower values run first.
    pub priority: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Google Maps Geocoding API. Requires an API key at runtime.
    Google {
        /// Endpoint URL.
        base_url: String,
        /// Request timeout in seconds.
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    /// Nominatim / `OpenStreetMap` geocoder.
    Nominatim {
        /// API base URL (e.g., `"https://nominatim.openstreetmap.org/search"`).
        base_url: String,
        /// Minimum delay between requests in milliseconds.
        rate_limit_ms: u64,
        /// Request timeout in seconds.
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
        /// Comma-separated ISO country codes to restrict results to.
        country_codes: String,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_timeout() -> u64 {
    10
}

impl GeocodingService {
    /// Returns the provider's base URL regardless of variant.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Google { base_url, .. }
            | ProviderConfig::Nominatim { base_url, .. } => base_url,
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("google", include_str!("../services/google.toml")),
    ("nominatim", include_str!("../services/nominatim.toml")),
];

/// Returns all geocoding service configurations (enabled and disabled).
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] if an embedded TOML file is malformed.
pub fn all_services() -> Result<Vec<GeocodingService>, GeocodeError> {
    SERVICE_TOMLS
        .iter()
        .map(|(id, toml_str)| {
            toml::de::from_str(toml_str).map_err(|e| GeocodeError::Config {
                id: (*id).to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// Returns only enabled services, sorted by priority (ascending).
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] if an embedded TOML file is malformed.
pub fn enabled_services() -> Result<Vec<GeocodingService>, GeocodeError> {
    let mut services: Vec<GeocodingService> =
        all_services()?.into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    Ok(services)
}
