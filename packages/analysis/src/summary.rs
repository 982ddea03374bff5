//! Human-readable summary, recommendations, and complaint breakdown.

use std::collections::BTreeMap;

use civic_safety_analysis_models::{CategoryBreakdown, SafetyMetrics, SafetyRating};
use civic_safety_incident_models::{IncidentRecord, SafetyCategory};

use crate::scorer::{ratio, top_incident_types};

const QUIET_AREA: &str =
    "This area has no reported incidents in our database, suggesting it's a quiet, low-activity area.";

/// Builds the one-paragraph summary of an area rating.
#[must_use]
pub fn safety_summary(
    subset: &[&IncidentRecord],
    metrics: &SafetyMetrics,
    rating: &SafetyRating,
) -> String {
    let total = metrics.total_complaints;
    if total == 0 {
        return QUIET_AREA.to_string();
    }

    let mut summary = format!(
        "This area is rated as {} (Grade {}) with a safety score of {}/5.0. ",
        rating.description,
        rating.grade,
        format_score(rating.score)
    );

    if total == 1 {
        summary.push_str("There has been 1 reported incident");
    } else {
        summary.push_str(&format!("There have been {total} reported incidents"));
    }

    let top: Vec<String> = top_incident_types(subset.iter().copied(), 3)
        .into_iter()
        .map(|t| format!("{} {} complaints", t.count, t.incident_type.to_lowercase()))
        .collect();
    match top.as_slice() {
        [] => summary.push('.'),
        [only] => summary.push_str(&format!(", primarily {only}.")),
        [first, second] => summary.push_str(&format!(", mainly {first} and {second}.")),
        [first, second, third, ..] => {
            summary.push_str(&format!(", mainly {first}, {second}, and {third}."));
        }
    }

    if metrics.high_concern_ratio > 0.1 {
        summary.push_str(&format!(
            " {:.1}% of incidents are high-concern safety issues.",
            metrics.high_concern_ratio * 100.0
        ));
    } else {
        summary.push_str(" Most incidents are minor quality-of-life issues.");
    }

    summary
}

/// Safety recommendations for a rating.
#[must_use]
pub fn recommendations(rating: &SafetyRating, metrics: &SafetyMetrics) -> Vec<String> {
    let banded: [&str; 2] = if rating.score >= 4.0 {
        [
            "This is a safe area with minimal safety concerns.",
            "Continue normal safety precautions for urban living.",
        ]
    } else if rating.score >= 3.0 {
        [
            "This is generally a safe area with some minor issues.",
            "Be aware of your surroundings, especially at night.",
        ]
    } else if rating.score >= 2.0 {
        [
            "Exercise increased caution in this area.",
            "Consider avoiding late-night activities alone.",
        ]
    } else {
        [
            "This area has notable safety concerns.",
            "Take extra precautions and consider alternative locations.",
        ]
    };

    let mut out: Vec<String> = banded.iter().map(ToString::to_string).collect();

    if metrics.high_concern_ratio > 0.1 {
        out.push("There have been serious safety incidents reported recently.".to_string());
        out.push("Stay alert and report any suspicious activity to authorities.".to_string());
    }

    out.push("Always trust your instincts and prioritize personal safety.".to_string());
    out.push("Consider checking local community boards for recent updates.".to_string());
    out
}

/// Recommendations attached to an insufficient-data report.
#[must_use]
pub fn insufficient_data_recommendations() -> Vec<String> {
    [
        "No recent data available for safety analysis.",
        "Consider checking with local authorities or community resources.",
        "Use general urban safety precautions.",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

/// Per-category counts, shares, and top incident types. Categories with no
/// incidents are omitted.
#[must_use]
pub fn complaint_breakdown(
    subset: &[&IncidentRecord],
) -> BTreeMap<SafetyCategory, CategoryBreakdown> {
    let total = subset.len();
    SafetyCategory::all()
        .iter()
        .filter_map(|&category| {
            let in_category: Vec<&IncidentRecord> = subset
                .iter()
                .copied()
                .filter(|r| r.safety_category() == category)
                .collect();
            if in_category.is_empty() {
                return None;
            }
            Some((
                category,
                CategoryBreakdown {
                    count: in_category.len(),
                    percentage: ratio(in_category.len(), total) * 100.0,
                    description: category.description().to_string(),
                    top_complaints: top_incident_types(in_category, 3),
                },
            ))
        })
        .collect()
}

/// Formats a score the way it is shown to users: at least one decimal,
/// at most two.
#[must_use]
pub fn format_score(score: f64) -> String {
    let two = format!("{score:.2}");
    let trimmed = two.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use civic_safety_analysis_models::Grade;
    use civic_safety_incident_models::Borough;

    use crate::config::ScoringConfig;
    use crate::scorer::score;

    fn records(types: &[&str]) -> Vec<IncidentRecord> {
        types
            .iter()
            .enumerate()
            .map(|(i, t)| {
                IncidentRecord::new(i.to_string(), Utc::now(), *t, Borough::Bronx, "10451")
            })
            .collect()
    }

    fn summarize(types: &[&str]) -> String {
        let records = records(types);
        let refs: Vec<_> = records.iter().collect();
        let outcome = score(&refs, &ScoringConfig::default());
        safety_summary(&refs, &outcome.metrics, &outcome.rating)
    }

    #[test]
    fn formats_scores() {
        assert_eq!(format_score(2.0), "2.0");
        assert_eq!(format_score(3.75), "3.75");
        assert_eq!(format_score(3.1), "3.1");
        assert_eq!(format_score(1.0), "1.0");
    }

    #[test]
    fn empty_area_summary() {
        assert_eq!(summarize(&[]), QUIET_AREA);
    }

    #[test]
    fn single_incident_summary() {
        let summary = summarize(&["Noise - Residential"]);
        assert!(summary.contains(
            "There has been 1 reported incident, primarily 1 noise - residential complaints."
        ));
        assert!(summary.ends_with("Most incidents are minor quality-of-life issues."));
    }

    #[test]
    fn summary_lists_top_three_and_high_concern_share() {
        let summary = summarize(&["Assault", "Noise", "Noise", "Rodent", "Sewer"]);
        assert!(summary.starts_with("This area is rated as "));
        assert!(summary.contains(
            "There have been 5 reported incidents, mainly 2 noise complaints, \
             1 assault complaints, and 1 rodent complaints."
        ));
        assert!(summary.ends_with(" 20.0% of incidents are high-concern safety issues."));
    }

    #[test]
    fn two_types_use_and() {
        let summary = summarize(&["Noise", "Rodent"]);
        assert!(summary.contains("mainly 1 noise complaints and 1 rodent complaints."));
    }

    #[test]
    fn recommendations_by_band() {
        let metrics = SafetyMetrics::empty(5.0);
        let safe = recommendations(&SafetyRating::graded(4.2, Grade::B), &metrics);
        assert_eq!(safe[0], "This is a safe area with minimal safety concerns.");
        assert_eq!(safe.len(), 4);

        let mut risky = SafetyMetrics::empty(1.5);
        risky.high_concern_ratio = 0.4;
        let out = recommendations(&SafetyRating::graded(1.2, Grade::F), &risky);
        assert_eq!(out[0], "This area has notable safety concerns.");
        assert_eq!(out.len(), 6);
        assert_eq!(out[5], "Consider checking local community boards for recent updates.");
    }

    #[test]
    fn breakdown_covers_present_categories_only() {
        let records = records(&["Assault", "Robbery", "Noise", "Rodent"]);
        let refs: Vec<_> = records.iter().collect();
        let breakdown = complaint_breakdown(&refs);

        assert_eq!(breakdown.len(), 3);
        assert!(!breakdown.contains_key(&SafetyCategory::MediumConcern));
        let high = &breakdown[&SafetyCategory::HighConcern];
        assert_eq!(high.count, 2);
        assert!((high.percentage - 50.0).abs() < 1e-9);
        assert_eq!(high.top_complaints.len(), 2);
        let total: f64 = breakdown.values().map(|b| b.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }
}
