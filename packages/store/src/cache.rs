//! Scope-keyed incident cache with TTL validity.
//!
//! An entry is valid for a request iff it was stored under exactly the
//! requested scope and `now - fetched_at < ttl`. Entries recorded after an
//! upstream failure use the shorter retry TTL so the source is retried soon.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use civic_safety_incident_models::{IncidentRecord, IncidentScope};

/// How an entry's payload was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// A successful fetch.
    Fetched,
    /// A failed refetch that kept the previous payload.
    Stale,
    /// A failed fetch with nothing to keep; the payload is empty.
    Fallback,
}

/// One cached payload.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Scope the payload was fetched for.
    pub scope: IncidentScope,
    /// When the entry was stored. Drives TTL validity.
    pub fetched_at: DateTime<Utc>,
    /// When the payload was last fetched successfully. Equals `fetched_at`
    /// for fetched entries; `None` for fallback entries.
    pub data_as_of: Option<DateTime<Utc>>,
    /// The incident records.
    pub records: Arc<[IncidentRecord]>,
    /// How the payload was obtained.
    pub origin: EntryOrigin,
}

/// In-memory `scope -> entry` map with TTL policy.
#[derive(Debug)]
pub struct IncidentCache {
    entries: BTreeMap<IncidentScope, CacheEntry>,
    ttl: Duration,
    retry_ttl: Duration,
}

impl IncidentCache {
    /// Creates an empty cache. `ttl` applies to fetched entries,
    /// `retry_ttl` to stale and fallback entries.
    #[must_use]
    pub const fn new(ttl: Duration, retry_ttl: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            ttl,
            retry_ttl,
        }
    }

    /// Returns the entry for `scope` if it is still within its TTL at `now`.
    #[must_use]
    pub fn get_valid(&self, scope: IncidentScope, now: DateTime<Utc>) -> Option<&CacheEntry> {
        let entry = self.entries.get(&scope)?;
        debug_assert_eq!(entry.scope, scope);
        let ttl = match entry.origin {
            EntryOrigin::Fetched => self.ttl,
            EntryOrigin::Stale | EntryOrigin::Fallback => self.retry_ttl,
        };
        (now - entry.fetched_at < ttl).then_some(entry)
    }

    /// Returns the entry for `scope` regardless of age.
    #[must_use]
    pub fn get_any(&self, scope: IncidentScope) -> Option<&CacheEntry> {
        self.entries.get(&scope)
    }

    /// Stores `entry`, replacing any previous entry for its scope.
    pub fn insert(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.scope, entry);
    }

    /// Drops every entry except the one for `scope`. Returns how many were
    /// dropped.
    pub fn retain_only(&mut self, scope: IncidentScope) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| *key == scope);
        before - self.entries.len()
    }

    /// Number of stored entries (valid or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_safety_incident_models::Borough;

    fn entry(scope: IncidentScope, fetched_at: DateTime<Utc>, origin: EntryOrigin) -> CacheEntry {
        CacheEntry {
            scope,
            fetched_at,
            data_as_of: Some(fetched_at),
            records: Arc::from(Vec::new()),
            origin,
        }
    }

    fn cache() -> IncidentCache {
        IncidentCache::new(Duration::hours(1), Duration::minutes(5))
    }

    #[test]
    fn entry_is_valid_within_ttl() {
        let now = Utc::now();
        let mut cache = cache();
        cache.insert(entry(IncidentScope::All, now, EntryOrigin::Fetched));

        assert!(cache.get_valid(IncidentScope::All, now).is_some());
        assert!(
            cache
                .get_valid(IncidentScope::All, now + Duration::minutes(59))
                .is_some()
        );
    }

    #[test]
    fn entry_expires_at_ttl() {
        let now = Utc::now();
        let mut cache = cache();
        cache.insert(entry(IncidentScope::All, now, EntryOrigin::Fetched));

        assert!(
            cache
                .get_valid(IncidentScope::All, now + Duration::hours(1))
                .is_none()
        );
        assert!(cache.get_any(IncidentScope::All).is_some());
    }

    #[test]
    fn scope_must_match_exactly() {
        let now = Utc::now();
        let mut cache = cache();
        cache.insert(entry(IncidentScope::All, now, EntryOrigin::Fetched));

        assert!(
            cache
                .get_valid(IncidentScope::Borough(Borough::Brooklyn), now)
                .is_none()
        );
    }

    #[test]
    fn fallback_entries_use_retry_ttl() {
        let now = Utc::now();
        let mut cache = cache();
        let scope = IncidentScope::Borough(Borough::Queens);
        cache.insert(entry(scope, now, EntryOrigin::Fallback));

        assert!(
            cache
                .get_valid(scope, now + Duration::minutes(4))
                .is_some()
        );
        assert!(
            cache
                .get_valid(scope, now + Duration::minutes(5))
                .is_none()
        );
    }

    #[test]
    fn retain_only_keeps_one_scope() {
        let now = Utc::now();
        let mut cache = cache();
        assert!(cache.is_empty());
        cache.insert(entry(IncidentScope::All, now, EntryOrigin::Fetched));
        cache.insert(entry(
            IncidentScope::Borough(Borough::Bronx),
            now,
            EntryOrigin::Fetched,
        ));
        cache.insert(entry(
            IncidentScope::Borough(Borough::Queens),
            now,
            EntryOrigin::Stale,
        ));

        assert_eq!(cache.retain_only(IncidentScope::All), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_any(IncidentScope::All).is_some());
        assert_eq!(cache.retain_only(IncidentScope::All), 0);
    }
}
