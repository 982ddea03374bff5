//! Weighted safety scoring.
//!
//! Each incident carries the weight of its category. The mean weight is
//! mapped onto the 1–5 scale, then penalized for a high share of
//! high-concern incidents and for high daily activity.

use std::collections::{BTreeMap, HashMap};

use civic_safety_analysis_models::{Grade, IncidentTypeCount, SafetyMetrics, SafetyRating};
use civic_safety_incident_models::{IncidentRecord, SafetyCategory};

use crate::config::{GradeThresholds, ScoringConfig};

/// Metrics and the rating derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    /// Aggregate metrics.
    pub metrics: SafetyMetrics,
    /// Final rating.
    pub rating: SafetyRating,
}

/// Scores an incident subset.
///
/// An empty subset is not penalized: it scores the top of the scale.
#[must_use]
pub fn score(subset: &[&IncidentRecord], config: &ScoringConfig) -> ScoreOutcome {
    let metrics = compute_metrics(subset, config);
    let rating = rate(&metrics, config);
    ScoreOutcome { metrics, rating }
}

/// Computes the aggregate metrics of a subset.
#[must_use]
pub fn compute_metrics(subset: &[&IncidentRecord], config: &ScoringConfig) -> SafetyMetrics {
    let total = subset.len();
    if total == 0 {
        return SafetyMetrics::empty(config.scale.max_score);
    }

    let weight_sum: f64 = subset.iter().map(|r| r.safety_weight()).sum();
    let average_weight = weight_sum / as_f64(total);
    let base = (config.scale.max_score - average_weight * config.scale.weight_multiplier)
        .clamp(config.scale.min_score, config.scale.max_score);

    let mut category_counts: BTreeMap<SafetyCategory, usize> = BTreeMap::new();
    for record in subset {
        *category_counts.entry(record.safety_category()).or_default() += 1;
    }
    let high_concern = category_counts
        .get(&SafetyCategory::HighConcern)
        .copied()
        .unwrap_or(0);

    let category_distribution = category_counts
        .into_iter()
        .map(|(category, count)| (category, ratio(count, total)))
        .collect();

    SafetyMetrics {
        total_complaints: total,
        weighted_safety_score: round_to(base, 2),
        average_weight,
        complaints_per_day: round_to(complaints_per_day(subset), 3),
        high_concern_ratio: round_to(ratio(high_concern, total), 3),
        category_distribution,
    }
}

/// Incidents per day over the subset's observed span. Spans shorter than
/// one whole day count as one day.
fn complaints_per_day(subset: &[&IncidentRecord]) -> f64 {
    let (Some(earliest), Some(latest)) = (
        subset.iter().map(|r| r.created_at).min(),
        subset.iter().map(|r| r.created_at).max(),
    ) else {
        return 0.0;
    };
    let days = (latest - earliest).num_days().max(1);
    #[allow(clippy::cast_precision_loss)]
    let days = days as f64;
    as_f64(subset.len()) / days
}

/// Applies the concern and activity adjustments to the base score in
/// `metrics` and grades the result.
#[must_use]
pub fn rate(metrics: &SafetyMetrics, config: &ScoringConfig) -> SafetyRating {
    let mut score = metrics.weighted_safety_score;

    let concern = &config.concern;
    if metrics.high_concern_ratio > concern.high_ratio {
        score -= concern.high_penalty;
    } else if metrics.high_concern_ratio > concern.elevated_ratio {
        score -= concern.elevated_penalty;
    }

    let activity = &config.activity;
    if metrics.complaints_per_day > activity.very_high_per_day {
        score -= activity.very_high_penalty;
    } else if metrics.complaints_per_day > activity.high_per_day {
        score -= activity.high_penalty;
    }

    let score = round_to(score.clamp(config.scale.min_score, config.scale.max_score), 2);
    SafetyRating::graded(score, grade_for(score, &config.grades))
}

/// Maps a score to its letter grade.
#[must_use]
pub fn grade_for(score: f64, thresholds: &GradeThresholds) -> Grade {
    if score >= thresholds.a {
        Grade::A
    } else if score >= thresholds.b {
        Grade::B
    } else if score >= thresholds.c {
        Grade::C
    } else if score >= thresholds.d {
        Grade::D
    } else {
        Grade::F
    }
}

/// The `n` most frequent incident types, most frequent first. Ties are
/// broken by incident type so the order is stable.
#[must_use]
pub fn top_incident_types<'a>(
    incidents: impl IntoIterator<Item = &'a IncidentRecord>,
    n: usize,
) -> Vec<IncidentTypeCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for incident in incidents {
        *counts.entry(incident.incident_type.as_str()).or_default() += 1;
    }

    let mut counts: Vec<(&str, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    counts
        .into_iter()
        .take(n)
        .map(|(incident_type, count)| IncidentTypeCount {
            incident_type: incident_type.to_string(),
            count,
        })
        .collect()
}

/// Rounds to `places` decimal places.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// `part / whole`, or zero for an empty whole.
#[must_use]
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        as_f64(part) / as_f64(whole)
    }
}

#[allow(clippy::cast_precision_loss)]
const fn as_f64(n: usize) -> f64 {
    n as f64
}
