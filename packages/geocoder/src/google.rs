//! Google Maps Geocoding API client.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use std::time::Duration;

use async_trait::async_trait;

use crate::{GeocodeError, GeocodedPoint, Geocoder, GeocodingProvider};

/// Geocoder backed by the Google Maps Geocoding API.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    /// Creates a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedPoint>, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Geocoding API JSON response.
///
/// `ZERO_RESULTS` is a miss, `OVER_QUERY_LIMIT` is a rate limit, and any
/// other non-`OK` status is an error carrying the status string.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedPoint>, GeocodeError> {
    let status = body["status"].as_str().ok_or_else(|| GeocodeError::Parse {
        message: "Missing status in Google geocoding response".to_string(),
    })?;

    match status {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(None),
        "OVER_QUERY_LIMIT" => return Err(GeocodeError::RateLimited),
        other => {
            return Err(GeocodeError::Status {
                status: other.to_string(),
            });
        }
    }

    let Some(first) = body["results"].as_array().and_then(|r| r.first()) else {
        return Ok(None);
    };

    let location = &first["geometry"]["location"];
    let lat = location["lat"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "Missing lat in Google geocoding response".to_string(),
    })?;
    let lng = location["lng"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "Missing lng in Google geocoding response".to_string(),
    })?;

    Ok(Some(GeocodedPoint {
        latitude: lat,
        longitude: lng,
        matched_address: first["formatted_address"].as_str().map(String::from),
        provider: GeocodingProvider::Google,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_result_location() {
        let body = serde_json::json!({
            "status": "OK",
            "results": [
                {
                    "formatted_address": "350 5th Ave, New York, NY 10118, USA",
                    "geometry": { "location": { "lat": 40.748_440_5, "lng": -73.985_664_4 } }
                },
                {
                    "geometry": { "location": { "lat": 0.0, "lng": 0.0 } }
                }
            ]
        });
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.latitude - 40.748_440_5).abs() < 1e-9);
        assert!((result.longitude - -73.985_664_4).abs() < 1e-9);
        assert_eq!(result.provider, GeocodingProvider::Google);
        assert_eq!(
            result.matched_address.as_deref(),
            Some("350 5th Ave, New York, NY 10118, USA")
        );
    }

    #[test]
    fn zero_results_is_a_miss() {
        let body = serde_json::json!({ "status": "ZERO_RESULTS", "results": [] });
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn denied_request_reports_status() {
        let body = serde_json::json!({ "status": "REQUEST_DENIED", "error_message": "bad key" });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GeocodeError::Status { status } if status == "REQUEST_DENIED"));
    }

    #[test]
    fn over_query_limit_is_rate_limited() {
        let body = serde_json::json!({ "status": "OVER_QUERY_LIMIT" });
        assert!(matches!(
            parse_response(&body).unwrap_err(),
            GeocodeError::RateLimited
        ));
    }

    #[test]
    fn missing_location_is_a_parse_error() {
        let body = serde_json::json!({ "status": "OK", "results": [{ "geometry": {} }] });
        assert!(matches!(
            parse_response(&body).unwrap_err(),
            GeocodeError::Parse { .. }
        ));
    }
}
