//! Nominatim / OpenStreetMap geocoder client.
//!
//! Used when no Google API key is configured or Google fails to match.
//! Nominatim has strict rate limits: **1 request per second** maximum, which
//! this client enforces itself.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{GeocodeError, GeocodedPoint, Geocoder, GeocodingProvider};

/// Free-form Nominatim search client.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    country_codes: String,
    rate_limit: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    /// Creates a client that waits at least `rate_limit` between requests.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        country_codes: &str,
        rate_limit: Duration,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("civic-safety/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            country_codes: country_codes.to_string(),
            rate_limit,
            last_request: Mutex::new(None),
        })
    }

    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.rate_limit {
                tokio::time::sleep(self.rate_limit - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedPoint>, GeocodeError> {
        self.throttle().await;

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", address),
                ("countrycodes", self.country_codes.as_str()),
                ("format", "jsonv2"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_response(&body)
    }
}

/// Parses Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedPoint>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    Ok(Some(GeocodedPoint {
        latitude: lat,
        longitude: lon,
        matched_address: first["display_name"].as_str().map(String::from),
        provider: GeocodingProvider::Nominatim,
    }))
}
