//! Route classification and recommendation.

use civic_safety_analysis::config::{GradeThresholds, RouteConfig};
use civic_safety_routing_models::{Recommendation, RouteCandidate, RouteType};

/// Describes a route's overall safety score.
#[must_use]
pub fn safety_description(score: f64, segment_count: usize, grades: &GradeThresholds) -> String {
    if score >= grades.a {
        format!("Excellent safety route through {segment_count} low-risk areas")
    } else if score >= grades.b {
        "Generally safe route with good neighborhood ratings".to_string()
    } else if score >= grades.c {
        "Moderate safety route - stay alert during travel".to_string()
    } else if score >= grades.d {
        "Some safety concerns along this route".to_string()
    } else {
        "Higher risk route - consider alternatives if possible".to_string()
    }
}

/// Warnings for a route's overall safety score.
#[must_use]
pub fn warnings(score: f64, config: &RouteConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if score < config.warning_below {
        warnings.push("This route passes through areas with higher crime reports".to_string());
    }
    if score < config.severe_warning_below {
        warnings.push("Consider traveling during daylight hours".to_string());
        warnings.push("Stay aware of your surroundings".to_string());
    }
    warnings
}

/// Labels routes and orders them safest, fastest, balanced, then the rest
/// in their original order.
///
/// The fastest route is only labelled when it differs from the safest, and
/// a balanced route needs at least three routes. Ties keep input order.
#[must_use]
pub fn categorize(routes: Vec<RouteCandidate>) -> Vec<RouteCandidate> {
    if routes.is_empty() {
        return routes;
    }

    let safest = (0..routes.len())
        .max_by(|&a, &b| {
            routes[a]
                .overall_safety_score
                .total_cmp(&routes[b].overall_safety_score)
                // `max_by` keeps the last maximum; prefer the earlier index.
                .then(b.cmp(&a))
        })
        .unwrap_or(0);
    let fastest = (0..routes.len())
        .min_by_key(|&i| routes[i].total_duration.value)
        .filter(|&i| routes[i].route_id != routes[safest].route_id);
    let balanced = if routes.len() >= 3 {
        (0..routes.len()).find(|&i| i != safest && Some(i) != fastest)
    } else {
        None
    };

    let mut labelled: Vec<Option<RouteCandidate>> = routes.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(labelled.len());

    for (index, route_type) in [
        (Some(safest), RouteType::Safest),
        (fastest, RouteType::Fastest),
        (balanced, RouteType::Balanced),
    ] {
        if let Some(mut route) = index.and_then(|i| labelled[i].take()) {
            route.route_type = route_type;
            ordered.push(route);
        }
    }

    ordered.extend(labelled.into_iter().flatten().map(|mut route| {
        route.route_type = RouteType::Unclassified;
        route
    }));

    ordered
}

/// Picks the route to recommend from categorized routes.
#[must_use]
pub fn recommend(routes: &[RouteCandidate], config: &RouteConfig) -> Recommendation {
    let of_type = |t: RouteType| routes.iter().find(|r| r.route_type == t);

    let (route, reason) = match (
        of_type(RouteType::Safest),
        of_type(RouteType::Balanced),
        of_type(RouteType::Fastest),
    ) {
        (Some(safest), _, _) if safest.overall_safety_score >= config.recommend_safest_at => (
            safest,
            format!(
                "Recommended for excellent safety (Grade {}) with only a small time difference.",
                safest.overall_safety_grade
            ),
        ),
        (_, Some(balanced), _) => (
            balanced,
            "Recommended for the best balance of safety and travel time.".to_string(),
        ),
        (_, _, Some(fastest)) => (
            fastest,
            "Fastest available option. Consider safety precautions during travel.".to_string(),
        ),
        _ => match routes.first() {
            Some(first) => (first, "Default route option.".to_string()),
            None => {
                return Recommendation {
                    recommended_route_id: None,
                    reason: "No routes available".to_string(),
                };
            }
        },
    };

    Recommendation {
        recommended_route_id: Some(route.route_id.clone()),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_safety_analysis::ScoringConfig;
    use civic_safety_analysis_models::Grade;
    use civic_safety_routing_models::Measure;

    fn candidate(index: usize, score: f64, minutes: u64) -> RouteCandidate {
        RouteCandidate {
            route_id: format!("route_{index}"),
            summary: format!("Route {}", index + 1),
            total_duration: Measure::new(format!("{minutes} mins"), minutes * 60),
            total_distance: Measure::new("1 mi", 1609),
            overall_safety_score: score,
            overall_safety_grade: Grade::C,
            safety_description: String::new(),
            segments: Vec::new(),
            polyline: String::new(),
            route_type: RouteType::Unclassified,
            warnings: Vec::new(),
        }
    }

    fn ids_and_types(routes: &[RouteCandidate]) -> Vec<(&str, RouteType)> {
        routes
            .iter()
            .map(|r| (r.route_id.as_str(), r.route_type))
            .collect()
    }

    #[test]
    fn three_routes_get_all_labels() {
        let routes = categorize(vec![
            candidate(0, 4.2, 20),
            candidate(1, 3.0, 15),
            candidate(2, 3.6, 18),
        ]);
        assert_eq!(
            ids_and_types(&routes),
            vec![
                ("route_0", RouteType::Safest),
                ("route_1", RouteType::Fastest),
                ("route_2", RouteType::Balanced),
            ]
        );

        let rec = recommend(&routes, &ScoringConfig::default().routes);
        assert_eq!(rec.recommended_route_id.as_deref(), Some("route_0"));
        assert!(rec.reason.starts_with("Recommended for excellent safety"));
    }

    #[test]
    fn safest_and_fastest_never_coincide() {
        let routes = categorize(vec![candidate(0, 3.0, 30), candidate(1, 4.5, 10)]);
        assert_eq!(
            ids_and_types(&routes),
            vec![
                ("route_1", RouteType::Safest),
                ("route_0", RouteType::Unclassified),
            ]
        );

        let single = categorize(vec![candidate(0, 2.0, 10)]);
        assert_eq!(ids_and_types(&single), vec![("route_0", RouteType::Safest)]);
    }

    #[test]
    fn ties_keep_input_order() {
        // route_0 is both safest and fastest, so no route is labelled fastest.
        let routes = categorize(vec![
            candidate(0, 3.5, 12),
            candidate(1, 3.5, 12),
            candidate(2, 3.5, 12),
            candidate(3, 3.5, 12),
        ]);
        assert_eq!(
            ids_and_types(&routes),
            vec![
                ("route_0", RouteType::Safest),
                ("route_1", RouteType::Balanced),
                ("route_2", RouteType::Unclassified),
                ("route_3", RouteType::Unclassified),
            ]
        );
    }

    #[test]
    fn recommendation_falls_back() {
        let config = ScoringConfig::default().routes;

        let balanced = categorize(vec![
            candidate(0, 3.8, 20),
            candidate(1, 3.0, 15),
            candidate(2, 3.6, 18),
        ]);
        let rec = recommend(&balanced, &config);
        assert_eq!(rec.recommended_route_id.as_deref(), Some("route_2"));

        let two = categorize(vec![candidate(0, 3.8, 20), candidate(1, 3.0, 15)]);
        let rec = recommend(&two, &config);
        assert_eq!(rec.recommended_route_id.as_deref(), Some("route_1"));
        assert!(rec.reason.starts_with("Fastest available option"));

        let one = categorize(vec![candidate(0, 2.5, 20)]);
        let rec = recommend(&one, &config);
        assert_eq!(rec.recommended_route_id.as_deref(), Some("route_0"));
        assert_eq!(rec.reason, "Default route option.");

        let none = recommend(&[], &config);
        assert!(none.recommended_route_id.is_none());
        assert_eq!(none.reason, "No routes available");
    }

    #[test]
    fn descriptions_and_warnings() {
        let config = ScoringConfig::default();
        assert_eq!(
            safety_description(4.6, 3, &config.grades),
            "Excellent safety route through 3 low-risk areas"
        );
        assert_eq!(
            safety_description(2.5, 3, &config.grades),
            "Moderate safety route - stay alert during travel"
        );
        assert_eq!(
            safety_description(1.0, 3, &config.grades),
            "Higher risk route - consider alternatives if possible"
        );

        assert!(warnings(3.0, &config.routes).is_empty());
        assert_eq!(warnings(2.9, &config.routes).len(), 1);
        assert_eq!(warnings(1.9, &config.routes).len(), 3);
    }
}
