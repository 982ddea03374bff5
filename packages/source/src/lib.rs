#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Civic incident data source trait and normalization logic.
//!
//! An [`IncidentSource`] fetches raw service requests for a time window and
//! an [`IncidentScope`], normalizes every row into an [`IncidentRecord`],
//! and classifies it. The only production implementation is the NYC 311
//! Socrata feed in [`sources::nyc_311`].

pub mod parsing;
pub mod retry;
pub mod socrata;
pub mod sources;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use civic_safety_incident_models::{IncidentRecord, IncidentScope};

/// Errors that can occur during data source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a non-success status.
    #[error("Unexpected HTTP status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// Data normalization error.
    #[error("Normalization error: {message}")]
    Normalization {
        /// Description of what went wrong.
        message: String,
    },
}

/// The `created_date` range to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Inclusive end.
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    /// The `days` days ending at `now`.
    #[must_use]
    pub fn trailing_days(now: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: now - Duration::days(i64::from(days)),
            end: now,
        }
    }
}

/// Trait that all incident data sources must implement.
#[async_trait]
pub trait IncidentSource: Send + Sync {
    /// Returns a unique identifier for this source (e.g., `"nyc_311"`).
    fn id(&self) -> &str;

    /// Returns the human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetches and normalizes every incident created inside `window`,
    /// restricted to `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the upstream service is unreachable,
    /// answers with an error status, or returns an unparseable body.
    async fn fetch(
        &self,
        window: &FetchWindow,
        scope: IncidentScope,
    ) -> Result<Vec<IncidentRecord>, SourceError>;
}
