//! Scoring calibration.
//!
//! Every threshold used by the scorer, the trend analyzer, and the route
//! categorizer lives in [`ScoringConfig`]. The defaults are embedded from
//! `config/scoring.toml`; an override file can be loaded at runtime.

use std::path::Path;

use serde::Deserialize;

use crate::AnalysisError;

const EMBEDDED: &str = include_str!("../config/scoring.toml");

/// Bounds of the score scale and the weight-to-score multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScaleConfig {
    /// Lowest score.
    pub min_score: f64,
    /// Highest score; also the score of an incident-free area.
    pub max_score: f64,
    /// `base = max_score - mean_weight * weight_multiplier`.
    pub weight_multiplier: f64,
}

/// Minimum score for each letter grade. Anything below `d` is an F.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GradeThresholds {
    /// Minimum score for an A.
    pub a: f64,
    /// Minimum score for a B.
    pub b: f64,
    /// Minimum score for a C.
    pub c: f64,
    /// Minimum score for a D.
    pub d: f64,
}

/// Penalties for the share of high-concern incidents.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ConcernConfig {
    /// Ratio above which `high_penalty` applies.
    pub high_ratio: f64,
    /// Penalty for a ratio above `high_ratio`.
    pub high_penalty: f64,
    /// Ratio above which `elevated_penalty` applies.
    pub elevated_ratio: f64,
    /// Penalty for a ratio above `elevated_ratio`.
    pub elevated_penalty: f64,
}

/// Penalties for overall incident activity.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ActivityConfig {
    /// Incidents per day above which `very_high_penalty` applies.
    pub very_high_per_day: f64,
    /// Penalty for very high activity.
    pub very_high_penalty: f64,
    /// Incidents per day above which `high_penalty` applies.
    pub high_per_day: f64,
    /// Penalty for high activity.
    pub high_penalty: f64,
}

/// Recent-activity trend parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TrendConfig {
    /// Length of each comparison window.
    pub window_days: u32,
    /// `recent > previous * increase_factor` is increasing.
    pub increase_factor: f64,
    /// `recent < previous * decrease_factor` is decreasing.
    pub decrease_factor: f64,
}

/// Area query defaults and limits.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AreaConfig {
    /// Radius used when an address query does not give one.
    pub default_radius_miles: f64,
    /// Largest accepted radius.
    pub max_radius_miles: f64,
}

/// Route recommendation and warning thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RouteConfig {
    /// The safest route is recommended outright at or above this score.
    pub recommend_safest_at: f64,
    /// Routes below this score get a crime-area warning.
    pub warning_below: f64,
    /// Routes below this score also get daylight and awareness warnings.
    pub severe_warning_below: f64,
}

/// All scoring thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScoringConfig {
    /// Score scale.
    pub scale: ScaleConfig,
    /// Grade cutoffs.
    pub grades: GradeThresholds,
    /// High-concern penalties.
    pub concern: ConcernConfig,
    /// Activity penalties.
    pub activity: ActivityConfig,
    /// Trend windows.
    pub trend: TrendConfig,
    /// Area query limits.
    pub area: AreaConfig,
    /// Route thresholds.
    pub routes: RouteConfig,
}

impl Default for ScoringConfig {
    /// The embedded `config/scoring.toml`.
    fn default() -> Self {
        Self::embedded()
            .unwrap_or_else(|e| panic!("Failed to parse embedded scoring config: {e}"))
    }
}

impl ScoringConfig {
    /// Parses the config embedded at build time.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] if the embedded file is invalid.
    pub fn embedded() -> Result<Self, AnalysisError> {
        Self::from_toml_str(EMBEDDED)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] if the document does not parse or
    /// its thresholds are inconsistent.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, AnalysisError> {
        let config: Self = toml::de::from_str(toml_str).map_err(|e| AnalysisError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Io`] if the file cannot be read, or
    /// [`AnalysisError::Config`] if it is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        log::info!("Loaded scoring config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Every floating-point setting, by its TOML key.
    fn float_fields(&self) -> [(&'static str, f64); 22] {
        [
            ("scale.min_score", self.scale.min_score),
            ("scale.max_score", self.scale.max_score),
            ("scale.weight_multiplier", self.scale.weight_multiplier),
            ("grades.a", self.grades.a),
            ("grades.b", self.grades.b),
            ("grades.c", self.grades.c),
            ("grades.d", self.grades.d),
            ("concern.high_ratio", self.concern.high_ratio),
            ("concern.high_penalty", self.concern.high_penalty),
            ("concern.elevated_ratio", self.concern.elevated_ratio),
            ("concern.elevated_penalty", self.concern.elevated_penalty),
            ("activity.very_high_per_day", self.activity.very_high_per_day),
            ("activity.very_high_penalty", self.activity.very_high_penalty),
            ("activity.high_per_day", self.activity.high_per_day),
            ("activity.high_penalty", self.activity.high_penalty),
            ("trend.increase_factor", self.trend.increase_factor),
            ("trend.decrease_factor", self.trend.decrease_factor),
            ("area.default_radius_miles", self.area.default_radius_miles),
            ("area.max_radius_miles", self.area.max_radius_miles),
            ("routes.recommend_safest_at", self.routes.recommend_safest_at),
            ("routes.warning_below", self.routes.warning_below),
            ("routes.severe_warning_below", self.routes.severe_warning_below),
        ]
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |message: &str| {
            Err(AnalysisError::Config {
                message: message.to_string(),
            })
        };

        if let Some((key, _)) = self
            .float_fields()
            .into_iter()
            .find(|(_, value)| !value.is_finite())
        {
            return invalid(&format!("{key} must be a finite number"));
        }
        if self.scale.min_score >= self.scale.max_score {
            return invalid("scale.min_score must be below scale.max_score");
        }
        if self.scale.weight_multiplier <= 0.0 {
            return invalid("scale.weight_multiplier must be positive");
        }
        let g = &self.grades;
        if !(g.a > g.b && g.b > g.c && g.c > g.d) {
            return invalid("grade thresholds must be strictly decreasing from a to d");
        }
        if self.concern.high_ratio < self.concern.elevated_ratio {
            return invalid("concern.high_ratio must not be below concern.elevated_ratio");
        }
        if self.activity.very_high_per_day < self.activity.high_per_day {
            return invalid(
                "activity.very_high_per_day must not be below activity.high_per_day",
            );
        }
        if self.trend.window_days == 0 {
            return invalid("trend.window_days must be at least 1");
        }
        if self.trend.increase_factor < self.trend.decrease_factor {
            return invalid("trend.increase_factor must not be below trend.decrease_factor");
        }
        if !(self.area.default_radius_miles > 0.0
            && self.area.default_radius_miles <= self.area.max_radius_miles)
        {
            return invalid("area.default_radius_miles must be in (0, max_radius_miles]");
        }
        if self.routes.severe_warning_below > self.routes.warning_below {
            return invalid("routes.severe_warning_below must not exceed routes.warning_below");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_embedded_config() {
        let config = ScoringConfig::default();
        assert_eq!(ScoringConfig::embedded().unwrap(), config);
        assert!((config.scale.max_score - 5.0).abs() < f64::EPSILON);
        assert!((config.grades.a - 4.5).abs() < f64::EPSILON);
        assert_eq!(config.trend.window_days, 30);
        assert!((config.routes.recommend_safest_at - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_non_finite_values() {
        for (from, to) in [
            ("min_score = 1.0", "min_score = nan"),
            ("max_score = 5.0", "max_score = inf"),
            ("d = 1.5", "d = nan"),
            ("severe_warning_below = 2.0", "severe_warning_below = -inf"),
        ] {
            let err = ScoringConfig::from_toml_str(&EMBEDDED.replace(from, to)).unwrap_err();
            assert!(
                matches!(&err, AnalysisError::Config { message } if message.contains("finite")),
                "{to}: {err}"
            );
        }
    }

    #[test]
    fn rejects_unordered_grades() {
        let toml_str = EMBEDDED.replace("b = 3.5", "b = 4.8");
        let err = ScoringConfig::from_toml_str(&toml_str).unwrap_err();
        assert!(matches!(err, AnalysisError::Config { .. }));
    }

    #[test]
    fn rejects_missing_section() {
        let toml_str = EMBEDDED.replace("[routes]", "[unused]");
        assert!(ScoringConfig::from_toml_str(&toml_str).is_err());
    }

    #[test]
    fn override_can_change_calibration() {
        let toml_str = EMBEDDED.replace("window_days = 30", "window_days = 14");
        let config = ScoringConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(config.trend.window_days, 14);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScoringConfig::from_path("/nonexistent/scoring.toml").unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}
