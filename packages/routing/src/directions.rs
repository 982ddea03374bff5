//! Routing service clients.
//!
//! See <https://developers.google.com/maps/documentation/directions/get-directions>

use std::time::Duration;

use async_trait::async_trait;
use civic_safety_analysis_models::GeoPoint;
use civic_safety_routing_models::{
    DirectionsLeg, DirectionsRoute, DirectionsStep, Measure, TravelMode,
};

use crate::DirectionsError;

/// Default Directions API endpoint.
pub const GOOGLE_DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// Timeout for a directions request.
pub const DIRECTIONS_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns candidate routes between two places.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Requests routes from `origin` to `destination`, with alternatives.
    ///
    /// # Errors
    ///
    /// Returns [`DirectionsError`] if the request fails or the service
    /// reports a non-OK status.
    async fn routes(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<Vec<DirectionsRoute>, DirectionsError>;
}

/// Google Directions API client.
pub struct GoogleDirections {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleDirections {
    /// Creates a client for the public endpoint with a 10 second timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DirectionsError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, DirectionsError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(DIRECTIONS_TIMEOUT)
                .build()?,
            base_url: GOOGLE_DIRECTIONS_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Overrides the endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl DirectionsProvider for GoogleDirections {
    async fn routes(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<Vec<DirectionsRoute>, DirectionsError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("mode", mode.as_ref()),
                ("alternatives", "true"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(DirectionsError::Status {
                status: resp.status().to_string(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Directions API JSON response.
///
/// `ZERO_RESULTS` and `NOT_FOUND` mean no routes. Steps without both end
/// points are skipped.
///
/// # Errors
///
/// Returns [`DirectionsError::Status`] for any other non-`OK` status, or
/// [`DirectionsError::Parse`] if the body has no status.
pub fn parse_response(body: &serde_json::Value) -> Result<Vec<DirectionsRoute>, DirectionsError> {
    let status = body["status"].as_str().ok_or_else(|| DirectionsError::Parse {
        message: "Missing status in directions response".to_string(),
    })?;

    match status {
        "OK" => {}
        "ZERO_RESULTS" | "NOT_FOUND" => return Ok(Vec::new()),
        other => {
            return Err(DirectionsError::Status {
                status: other.to_string(),
            });
        }
    }

    let routes = body["routes"]
        .as_array()
        .map(|routes| routes.iter().map(parse_route).collect())
        .unwrap_or_default();
    Ok(routes)
}

fn parse_route(route: &serde_json::Value) -> DirectionsRoute {
    let legs = route["legs"]
        .as_array()
        .map(|legs| legs.iter().map(parse_leg).collect())
        .unwrap_or_default();

    DirectionsRoute {
        summary: route["summary"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
        legs,
        polyline: route["overview_polyline"]["points"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
    }
}

fn parse_leg(leg: &serde_json::Value) -> DirectionsLeg {
    let steps = leg["steps"]
        .as_array()
        .map(|steps| steps.iter().filter_map(parse_step).collect())
        .unwrap_or_default();

    DirectionsLeg {
        duration: parse_measure(&leg["duration"]),
        distance: parse_measure(&leg["distance"]),
        steps,
    }
}

fn parse_step(step: &serde_json::Value) -> Option<DirectionsStep> {
    let Some((start, end)) =
        parse_point(&step["start_location"]).zip(parse_point(&step["end_location"]))
    else {
        log::debug!("Skipping directions step without start/end location");
        return None;
    };

    Some(DirectionsStep {
        start,
        end,
        duration: parse_measure(&step["duration"]),
        distance: parse_measure(&step["distance"]),
    })
}

fn parse_point(value: &serde_json::Value) -> Option<GeoPoint> {
    Some(GeoPoint::new(value["lat"].as_f64()?, value["lng"].as_f64()?))
}

fn parse_measure(value: &serde_json::Value) -> Measure {
    Measure::new(
        value["text"].as_str().unwrap_or_default(),
        value["value"].as_u64().unwrap_or(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(start: (f64, f64), end: (f64, f64), seconds: u64, meters: u64) -> serde_json::Value {
        json!({
            "start_location": { "lat": start.0, "lng": start.1 },
            "end_location": { "lat": end.0, "lng": end.1 },
            "duration": { "text": format!("{} mins", seconds / 60), "value": seconds },
            "distance": { "text": format!("{meters} m"), "value": meters }
        })
    }

    #[test]
    fn parses_routes_legs_and_steps() {
        let body = json!({
            "status": "OK",
            "routes": [
                {
                    "summary": "FDR Dr",
                    "overview_polyline": { "points": "a~l~Fjk~uOwHJy@P" },
                    "legs": [{
                        "duration": { "text": "20 mins", "value": 1200 },
                        "distance": { "text": "5.1 mi", "value": 8200 },
                        "steps": [
                            step((40.75, -73.99), (40.74, -73.97), 600, 4000),
                            step((40.74, -73.97), (40.71, -73.98), 600, 4200)
                        ]
                    }]
                },
                { "summary": "", "legs": [] }
            ]
        });

        let routes = parse_response(&body).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].summary.as_deref(), Some("FDR Dr"));
        assert_eq!(routes[0].polyline, "a~l~Fjk~uOwHJy@P");
        assert_eq!(routes[0].legs[0].duration.value, 1200);
        assert_eq!(routes[0].legs[0].steps.len(), 2);
        assert_eq!(routes[0].legs[0].steps[1].distance.value, 4200);
        assert!(routes[1].summary.is_none());
        assert!(routes[1].legs.is_empty());
    }

    #[test]
    fn zero_results_is_empty() {
        let body = json!({ "status": "ZERO_RESULTS", "routes": [] });
        assert!(parse_response(&body).unwrap().is_empty());
    }

    #[test]
    fn non_ok_status_is_an_error() {
        let body = json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
        });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, DirectionsError::Status { status } if status == "REQUEST_DENIED"));
    }

    #[test]
    fn skips_steps_without_locations() {
        let body = json!({
            "status": "OK",
            "routes": [{
                "legs": [{
                    "steps": [
                        { "duration": { "value": 5 } },
                        step((40.7, -73.9), (40.71, -73.91), 60, 100)
                    ]
                }]
            }]
        });
        let routes = parse_response(&body).unwrap();
        assert_eq!(routes[0].legs[0].steps.len(), 1);
        assert_eq!(routes[0].legs[0].duration, Measure::default());
    }
}
