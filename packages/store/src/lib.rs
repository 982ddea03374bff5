#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory incident store.
//!
//! [`IncidentStore`] owns an [`IncidentCache`] and an [`IncidentSource`].
//! Reads reuse a valid cache entry for the exact scope; otherwise the
//! trailing window is fetched again. Upstream failures never reach the
//! caller: the store keeps serving the previous payload as
//! [`DataSource::Stale`] when it has one, and an empty
//! [`DataSource::Fallback`] set when it does not.
//!
//! The cache lock is held across the fetch, so a read-then-refetch is
//! atomic and concurrent callers for the same scope trigger one request.

pub mod cache;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use civic_safety_incident_models::{DataSource, IncidentRecord, IncidentScope};
use civic_safety_source::{FetchWindow, IncidentSource};
use tokio::sync::Mutex;

pub use cache::{CacheEntry, EntryOrigin, IncidentCache};

/// Store tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// How long a successful fetch stays valid.
    pub ttl: Duration,
    /// Length of the trailing `created_date` window to fetch.
    pub lookback_days: u32,
    /// How long a stale or fallback entry is served before the source is
    /// tried again.
    pub retry_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(1),
            lookback_days: 182,
            retry_ttl: Duration::minutes(5),
        }
    }
}

/// A read-only view of the records for one scope.
#[derive(Debug, Clone)]
pub struct IncidentSnapshot {
    /// Scope the records cover.
    pub scope: IncidentScope,
    /// The records.
    pub records: Arc<[IncidentRecord]>,
    /// When the records were last fetched successfully.
    pub data_as_of: Option<DateTime<Utc>>,
    /// Provenance of the records.
    pub data_source: DataSource,
}

impl IncidentSnapshot {
    fn from_entry(entry: &CacheEntry, fresh: bool) -> Self {
        let data_source = match (entry.origin, fresh) {
            (EntryOrigin::Fetched, true) => DataSource::Live,
            (EntryOrigin::Fetched, false) => DataSource::Cached,
            (EntryOrigin::Stale, _) => DataSource::Stale,
            (EntryOrigin::Fallback, _) => DataSource::Fallback,
        };
        Self {
            scope: entry.scope,
            records: Arc::clone(&entry.records),
            data_as_of: entry.data_as_of,
            data_source,
        }
    }

    /// Returns `true` when the store is running without upstream data.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.data_source, DataSource::Fallback)
    }
}

/// Cached, scope-keyed access to incident data.
pub struct IncidentStore {
    source: Arc<dyn IncidentSource>,
    cache: Mutex<IncidentCache>,
    config: StoreConfig,
}

impl IncidentStore {
    /// Creates a store with an empty cache.
    #[must_use]
    pub fn new(source: Arc<dyn IncidentSource>, config: StoreConfig) -> Self {
        Self {
            source,
            cache: Mutex::new(IncidentCache::new(config.ttl, config.retry_ttl)),
            config,
        }
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Ensures data for `scope` is loaded, fetching if the cache has no
    /// valid entry.
    ///
    /// Always returns `true`: upstream failures switch the scope into
    /// fallback mode instead of failing.
    pub async fn load(&self, scope: IncidentScope) -> bool {
        let snapshot = self.snapshot(scope).await;
        log::debug!(
            "Loaded {} incidents for {scope} ({})",
            snapshot.records.len(),
            snapshot.data_source
        );
        true
    }

    /// Returns the records for `scope`, fetching if the cache has no valid
    /// entry.
    pub async fn snapshot(&self, scope: IncidentScope) -> IncidentSnapshot {
        let mut cache = self.cache.lock().await;
        let now = Utc::now();

        if let Some(entry) = cache.get_valid(scope, now) {
            log::debug!("Incident cache hit for {scope}");
            return IncidentSnapshot::from_entry(entry, false);
        }

        log::debug!("Incident cache miss for {scope}");
        self.fetch_into(&mut cache, scope, now).await
    }

    /// Fetches `scope` again, ignoring the TTL of any cached entry.
    ///
    /// Returns `true` if the fetch succeeded. On failure the previous
    /// records stay in service as [`DataSource::Stale`], or the scope enters
    /// fallback mode if there were none. A successful refresh of
    /// [`IncidentScope::All`] also drops every per-borough entry.
    pub async fn refresh(&self, scope: IncidentScope) -> bool {
        let mut cache = self.cache.lock().await;
        log::info!("Refreshing incident data for {scope}");
        let snapshot = self.fetch_into(&mut cache, scope, Utc::now()).await;
        let refreshed = !snapshot.data_source.is_degraded();

        if refreshed && scope == IncidentScope::All {
            let dropped = cache.retain_only(IncidentScope::All);
            log::debug!("Dropped {dropped} per-borough incident entries");
        }

        refreshed
    }

    /// Checks that usable data is cached for `scope` without fetching.
    pub async fn validate(&self, scope: IncidentScope) -> bool {
        let cache = self.cache.lock().await;
        let Some(entry) = cache.get_any(scope) else {
            log::error!("Incident data not loaded for {scope}");
            return false;
        };
        if entry.origin == EntryOrigin::Fallback {
            log::error!("Incident data for {scope} is in fallback mode");
            return false;
        }
        if entry.records.is_empty() {
            log::error!("Incident data for {scope} is empty");
            return false;
        }
        log::info!("Incident data validation passed for {scope}");
        true
    }

    async fn fetch_into(
        &self,
        cache: &mut IncidentCache,
        scope: IncidentScope,
        now: DateTime<Utc>,
    ) -> IncidentSnapshot {
        let window = FetchWindow::trailing_days(now, self.config.lookback_days);
        log::info!(
            "Fetching {} incidents for {scope} since {}",
            self.source.name(),
            window.start.format("%Y-%m-%d")
        );

        let entry = match self.source.fetch(&window, scope).await {
            Ok(records) => {
                log::info!("Loaded {} incidents for {scope}", records.len());
                CacheEntry {
                    scope,
                    fetched_at: now,
                    data_as_of: Some(now),
                    records: Arc::from(records),
                    origin: EntryOrigin::Fetched,
                }
            }
            Err(e) => match cache.get_any(scope).filter(|prev| !prev.records.is_empty()) {
                Some(previous) => {
                    log::warn!(
                        "Failed to fetch incidents for {scope}: {e}; serving {} stale records",
                        previous.records.len()
                    );
                    CacheEntry {
                        scope,
                        fetched_at: now,
                        data_as_of: previous.data_as_of,
                        records: Arc::clone(&previous.records),
                        origin: EntryOrigin::Stale,
                    }
                }
                None => {
                    log::warn!(
                        "Failed to fetch incidents for {scope}: {e}; entering fallback mode"
                    );
                    CacheEntry {
                        scope,
                        fetched_at: now,
                        data_as_of: None,
                        records: Arc::from(Vec::new()),
                        origin: EntryOrigin::Fallback,
                    }
                }
            },
        };

        let snapshot = IncidentSnapshot::from_entry(&entry, true);
        cache.insert(entry);
        snapshot
    }
}
