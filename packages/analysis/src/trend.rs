//! Recent-activity trend detection.

use chrono::{DateTime, Duration, Utc};
use civic_safety_analysis_models::{RecentActivity, Trend};
use civic_safety_incident_models::IncidentRecord;

use crate::config::TrendConfig;

/// Compares the last `window_days` before `now` with the window before it.
///
/// Without any previous-window incidents the trend is always
/// [`Trend::Stable`].
#[must_use]
pub fn trend(
    subset: &[&IncidentRecord],
    now: DateTime<Utc>,
    config: &TrendConfig,
) -> RecentActivity {
    let window = Duration::days(i64::from(config.window_days));
    let cutoff = now - window;
    let previous_cutoff = cutoff - window;

    let recent = subset.iter().filter(|r| r.created_at >= cutoff).count();
    let previous = subset
        .iter()
        .filter(|r| r.created_at >= previous_cutoff && r.created_at < cutoff)
        .count();

    RecentActivity {
        recent_complaints: recent,
        previous_period_complaints: previous,
        trend: label(recent, previous, config),
        days_analyzed: config.window_days,
    }
}

#[allow(clippy::cast_precision_loss)]
fn label(recent: usize, previous: usize, config: &TrendConfig) -> Trend {
    if previous == 0 {
        return Trend::Stable;
    }
    let (recent, previous) = (recent as f64, previous as f64);
    if recent > previous * config.increase_factor {
        Trend::Increasing
    } else if recent < previous * config.decrease_factor {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use civic_safety_incident_models::Borough;

    use crate::config::ScoringConfig;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> IncidentRecord {
        IncidentRecord::new(
            format!("{days}"),
            now() - Duration::days(days),
            "Noise",
            Borough::Queens,
            "11101",
        )
    }

    fn activity(recent: usize, previous: usize) -> RecentActivity {
        let mut records = Vec::new();
        for i in 0..recent {
            records.push(days_ago(i64::try_from(i % 30).unwrap()));
        }
        for i in 0..previous {
            records.push(days_ago(31 + i64::try_from(i % 29).unwrap()));
        }
        // Outside both windows.
        records.push(days_ago(90));
        let refs: Vec<_> = records.iter().collect();
        trend(&refs, now(), &ScoringConfig::default().trend)
    }

    #[test]
    fn no_history_is_always_stable() {
        for recent in [0, 1, 5, 100] {
            let result = activity(recent, 0);
            assert_eq!(result.trend, Trend::Stable, "recent = {recent}");
            assert_eq!(result.previous_period_complaints, 0);
        }
    }

    #[test]
    fn counts_each_window() {
        let result = activity(7, 4);
        assert_eq!(result.recent_complaints, 7);
        assert_eq!(result.previous_period_complaints, 4);
        assert_eq!(result.days_analyzed, 30);
    }

    #[test]
    fn labels_against_factors() {
        assert_eq!(activity(13, 10).trend, Trend::Increasing);
        assert_eq!(activity(12, 10).trend, Trend::Stable);
        assert_eq!(activity(8, 10).trend, Trend::Stable);
        assert_eq!(activity(7, 10).trend, Trend::Decreasing);
    }

    #[test]
    fn window_boundaries() {
        let cutoff_exact = IncidentRecord::new(
            "edge",
            now() - Duration::days(30),
            "Noise",
            Borough::Queens,
            "11101",
        );
        let previous_edge = IncidentRecord::new(
            "prev-edge",
            now() - Duration::days(60),
            "Noise",
            Borough::Queens,
            "11101",
        );
        let result = trend(
            &[&cutoff_exact, &previous_edge],
            now(),
            &ScoringConfig::default().trend,
        );
        assert_eq!(result.recent_complaints, 1);
        assert_eq!(result.previous_period_complaints, 1);
    }
}
