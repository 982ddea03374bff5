#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area safety scoring.
//!
//! The pipeline for one area rating is:
//!
//! 1. [`area::AreaAnalyzer`] validates the query and geocodes its address.
//! 2. The incident store yields the records for the narrowest usable scope.
//! 3. [`geo_filter`] selects the incidents that belong to the area.
//! 4. [`scorer`] computes weighted metrics and the 1–5 rating.
//! 5. [`trend`] compares the recent window with the one before it.
//! 6. [`summary`] renders the summary, recommendations, and breakdown.
//!
//! Upstream failures never surface as errors here. They show up in the
//! report's `data_source` and `insufficient_data` fields instead.

pub mod area;
pub mod config;
pub mod geo_filter;
pub mod scorer;
pub mod summary;
pub mod trend;

pub use area::AreaAnalyzer;
pub use config::ScoringConfig;

/// Errors returned by area analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The query is malformed.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// The offending input field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// A scoring config is malformed.
    #[error("Invalid scoring config: {message}")]
    Config {
        /// Parser or validation message.
        message: String,
    },

    /// A scoring config file could not be read.
    #[error("Failed to read scoring config: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
