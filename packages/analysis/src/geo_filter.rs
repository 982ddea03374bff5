//! Selects the incidents that belong to an area.

use civic_safety_analysis_models::{AreaQuery, FilterMode, GeoPoint};
use civic_safety_incident_models::IncidentRecord;
use geo::{Distance, Haversine, Point};

/// Meters per statute mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Great-circle distance between two points, in miles.
#[must_use]
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b)) / METERS_PER_MILE
}

/// Incidents within `radius_miles` of `center`. Incidents without
/// coordinates are excluded.
#[must_use]
pub fn within_radius(
    incidents: &[IncidentRecord],
    center: GeoPoint,
    radius_miles: f64,
) -> Vec<&IncidentRecord> {
    incidents
        .iter()
        .filter(|incident| {
            incident.coordinates().is_some_and(|(lat, lon)| {
                haversine_miles(center, GeoPoint::new(lat, lon)) <= radius_miles
            })
        })
        .collect()
}

/// Applies `query` to `incidents`.
///
/// `location` is the geocoded address, if the query had one and it
/// resolved. With a location, the radius filter wins and the other
/// criteria are ignored. Otherwise the postal code and borough filters
/// apply together. A query with no usable criterion returns every incident
/// with [`FilterMode::Unresolved`]; callers decide whether that is wanted.
#[must_use]
pub fn filter<'a>(
    incidents: &'a [IncidentRecord],
    query: &AreaQuery,
    location: Option<GeoPoint>,
    radius_miles: f64,
) -> (Vec<&'a IncidentRecord>, FilterMode) {
    if let Some(center) = location {
        return (
            within_radius(incidents, center, radius_miles),
            FilterMode::Radius,
        );
    }

    let zip = query
        .zip_code
        .as_deref()
        .map(str::trim)
        .filter(|z| !z.is_empty());
    let mode = match (zip, query.borough) {
        (Some(_), Some(_)) => FilterMode::ZipCodeAndBorough,
        (Some(_), None) => FilterMode::ZipCode,
        (None, Some(_)) => FilterMode::Borough,
        (None, None) => FilterMode::Unresolved,
    };

    let subset = incidents
        .iter()
        .filter(|incident| zip.is_none_or(|z| incident.zip_code == z))
        .filter(|incident| query.borough.is_none_or(|b| incident.borough == b))
        .collect();

    (subset, mode)
}
