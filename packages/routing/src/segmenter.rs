//! Splits a route into per-step segments and scores each one.
//!
//! A segment's safety is approximated by the borough its midpoint falls
//! in. The borough is guessed from fixed latitude/longitude boxes, so it
//! can be wrong near borough lines.

use std::collections::HashMap;

use civic_safety_analysis::config::ScoringConfig;
use civic_safety_analysis::scorer::{grade_for, round_to};
use civic_safety_analysis_models::{BoroughComparison, GeoPoint};
use civic_safety_incident_models::{Borough, DataSource};
use civic_safety_routing_models::{
    DirectionsRoute, DirectionsStep, Measure, NeighborhoodInfo, RouteCandidate, RouteSegment,
    RouteType, ScoreSource,
};
use geo::{Contains, Intersects, Point, Rect, coord};

use crate::categorizer::{safety_description, warnings};

/// Score of a route whose segments have no total distance.
pub const NEUTRAL_ROUTE_SCORE: f64 = 3.0;

/// Score used for a borough with no incident data.
pub const DEFAULT_BOROUGH_SCORE: f64 = 3.5;

/// Approximates the borough containing a point.
///
/// Points outside the outer envelope of the five boroughs are
/// [`Borough::Unknown`]. Inside it, fixed boxes are checked in order: Bronx
/// (north and east), Staten Island (south and west), Brooklyn (south and
/// east), Queens (west of -73.9 after the above), and Manhattan for the
/// rest. Box edges are exclusive.
///
/// The boxes are coarse: most of Manhattan and western Brooklyn lies west
/// of -73.9 and comes out as Queens.
#[must_use]
pub fn estimate_borough(point: GeoPoint) -> Borough {
    let point = Point::from(point);

    if !nyc_envelope().intersects(&point) {
        return Borough::Unknown;
    }

    borough_boxes()
        .into_iter()
        .find(|(_, bounds)| bounds.contains(&point))
        .map_or(Borough::Manhattan, |(borough, _)| borough)
}

fn rect(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Rect<f64> {
    Rect::new(
        coord! { x: min_lng, y: min_lat },
        coord! { x: max_lng, y: max_lat },
    )
}

fn nyc_envelope() -> Rect<f64> {
    rect(-74.26, 40.49, -73.70, 40.92)
}

fn borough_boxes() -> [(Borough, Rect<f64>); 4] {
    [
        (Borough::Bronx, rect(-73.9, 40.8, 180.0, 90.0)),
        (Borough::StatenIsland, rect(-180.0, -90.0, -74.0, 40.7)),
        (Borough::Brooklyn, rect(-73.9, -90.0, 180.0, 40.7)),
        (Borough::Queens, rect(-180.0, -90.0, -73.9, 90.0)),
    ]
}

/// Fixed per-borough score used when there is no incident data.
#[must_use]
pub const fn static_borough_score(borough: Borough) -> f64 {
    match borough {
        Borough::Manhattan => 4.0,
        Borough::Brooklyn => 3.5,
        Borough::Queens => 3.8,
        Borough::Bronx => 3.2,
        Borough::StatenIsland => 4.2,
        Borough::Unknown => DEFAULT_BOROUGH_SCORE,
    }
}

/// Per-borough scores and incident counts, computed once per analysis.
#[derive(Debug, Clone, Default)]
pub struct BoroughScores {
    scores: HashMap<Borough, (f64, usize)>,
    data_source: Option<DataSource>,
}

impl BoroughScores {
    /// Uses the incident-based ratings in `comparison`.
    #[must_use]
    pub fn from_comparison(comparison: &BoroughComparison) -> Self {
        Self {
            scores: comparison
                .boroughs
                .iter()
                .map(|b| (b.borough, (b.safety_score, b.total_complaints)))
                .collect(),
            data_source: Some(comparison.data_source),
        }
    }

    /// Provenance of the underlying incident data, if any was used.
    #[must_use]
    pub const fn data_source(&self) -> Option<DataSource> {
        self.data_source
    }

    /// Score, provenance, and incident count for a borough.
    #[must_use]
    pub fn lookup(&self, borough: Borough) -> (f64, ScoreSource, usize) {
        self.scores.get(&borough).map_or(
            (static_borough_score(borough), ScoreSource::StaticDefault, 0),
            |&(score, count)| (score, ScoreSource::BoroughAggregate, count),
        )
    }
}

/// Midpoint of a step, by averaging coordinates.
#[must_use]
pub fn midpoint(step: &DirectionsStep) -> GeoPoint {
    GeoPoint::new(
        (step.start.latitude + step.end.latitude) / 2.0,
        (step.start.longitude + step.end.longitude) / 2.0,
    )
}

/// Scores one step.
#[must_use]
pub fn segment(
    step: &DirectionsStep,
    scores: &BoroughScores,
    config: &ScoringConfig,
) -> RouteSegment {
    let borough = estimate_borough(midpoint(step));
    let (safety_score, score_source, complaint_count) = scores.lookup(borough);

    RouteSegment {
        start_location: step.start,
        end_location: step.end,
        duration: step.duration.clone(),
        distance: step.distance.clone(),
        safety_score,
        safety_grade: grade_for(safety_score, &config.grades),
        score_source,
        neighborhood_info: NeighborhoodInfo {
            borough,
            complaint_count,
        },
    }
}

/// Distance-weighted mean of segment scores, or [`NEUTRAL_ROUTE_SCORE`]
/// when the segments cover no distance.
#[must_use]
pub fn overall_score(segments: &[RouteSegment]) -> f64 {
    let (weighted, total) = segments.iter().fold((0.0, 0.0), |(weighted, total), s| {
        #[allow(clippy::cast_precision_loss)]
        let distance = s.distance.value as f64;
        (weighted + s.safety_score * distance, total + distance)
    });
    if total > 0.0 {
        weighted / total
    } else {
        NEUTRAL_ROUTE_SCORE
    }
}

/// Sums leg measures. A single leg keeps its own display text.
fn total_measure<'a>(measures: impl Iterator<Item = &'a Measure>) -> Measure {
    let measures: Vec<&Measure> = measures.collect();
    match measures.as_slice() {
        [only] => (*only).clone(),
        _ => Measure::new(
            measures
                .iter()
                .map(|m| m.text.as_str())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" + "),
            measures.iter().map(|m| m.value).sum(),
        ),
    }
}

/// Analyzes one routing service route. Returns `None` for a route with no
/// legs.
#[must_use]
pub fn analyze_route(
    route: &DirectionsRoute,
    index: usize,
    scores: &BoroughScores,
    config: &ScoringConfig,
) -> Option<RouteCandidate> {
    if route.legs.is_empty() {
        log::warn!("Skipping route {index}: no legs");
        return None;
    }

    let segments: Vec<RouteSegment> = route
        .legs
        .iter()
        .flat_map(|leg| &leg.steps)
        .map(|step| segment(step, scores, config))
        .collect();

    let raw_score = overall_score(&segments);
    let overall_safety_score = round_to(raw_score, 2);

    Some(RouteCandidate {
        route_id: format!("route_{index}"),
        summary: route
            .summary
            .clone()
            .unwrap_or_else(|| format!("Route {}", index + 1)),
        total_duration: total_measure(route.legs.iter().map(|l| &l.duration)),
        total_distance: total_measure(route.legs.iter().map(|l| &l.distance)),
        overall_safety_score,
        overall_safety_grade: grade_for(overall_safety_score, &config.grades),
        safety_description: safety_description(raw_score, segments.len(), &config.grades),
        warnings: warnings(raw_score, &config.routes),
        segments,
        polyline: route.polyline.clone(),
        route_type: RouteType::Unclassified,
    })
}
