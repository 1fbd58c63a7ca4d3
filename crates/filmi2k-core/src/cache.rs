//! Time-bounded memoization and the slug reverse index
//!
//! All mutations are last-write-wins map insertions, so the maps are shared
//! between concurrent lookups without any further coordination.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::types::{CatalogEntry, ResolvedMeta, StreamDescriptor};

/// Builds a stable cache key from an operation name and its parameters
pub fn cache_key(operation: &str, params: &[&str]) -> String {
    let mut key = operation.to_string();
    for param in params {
        key.push(':');
        key.push_str(param);
    }
    key
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Longest time expired entries may linger before an insert sweeps them
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(600);

/// Map whose entries each expire after the cache's TTL
///
/// Expired entries are dropped when read, and all of them are swept on
/// the first insert after each sweep period (the TTL, at most ten minutes).
pub struct TtlCache<V> {
    ttl: Duration,
    entries: DashMap<String, Entry<V>>,
    next_sweep: Mutex<Instant>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
            next_sweep: Mutex::new(Instant::now() + ttl.min(MAX_SWEEP_PERIOD)),
        }
    }

    /// Returns a live entry, dropping it if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if now < entry.expires_at {
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }
        self.entries.remove_if(key, |_, e| now >= e.expires_at);
        None
    }

    pub fn insert(&self, key: String, value: V) {
        let now = Instant::now();
        self.sweep_if_due(now);
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Drops every expired entry
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, e| now < e.expires_at);
    }

    fn sweep_if_due(&self, now: Instant) {
        // A contended or poisoned lock means another insert is sweeping
        let Ok(mut next_sweep) = self.next_sweep.try_lock() else {
            return;
        };
        if now >= *next_sweep {
            *next_sweep = now + self.ttl.min(MAX_SWEEP_PERIOD);
            drop(next_sweep);
            self.entries.retain(|_, e| now < e.expires_at);
        }
    }

    /// Number of stored entries, expired ones included until the next sweep
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Process-wide state shared by every pipeline component
///
/// Created once at startup and never persisted. Tests build their own
/// instance so nothing leaks between them.
pub struct ScraperState {
    /// Catalog pages and search results (short-lived tier)
    pub(crate) listings: TtlCache<Vec<CatalogEntry>>,
    /// Stream lists per canonical id (short-lived tier)
    pub(crate) streams: TtlCache<Vec<StreamDescriptor>>,
    /// Identifier resolutions per slug (long-lived tier)
    pub(crate) resolutions: TtlCache<ResolvedMeta>,
    /// Structured API term ids per taxonomy/slug (long-lived tier)
    pub(crate) terms: TtlCache<u64>,
    /// canonical id -> site slug
    slug_by_id: DashMap<String, String>,
}

impl ScraperState {
    pub fn new(short_ttl: Duration, long_ttl: Duration) -> Self {
        Self {
            listings: TtlCache::new(short_ttl),
            streams: TtlCache::new(short_ttl),
            resolutions: TtlCache::new(long_ttl),
            terms: TtlCache::new(long_ttl),
            slug_by_id: DashMap::new(),
        }
    }

    /// Records which detail page a canonical id belongs to
    pub fn remember_slug(&self, canonical_id: &str, slug: &str) {
        self.slug_by_id
            .insert(canonical_id.to_string(), slug.to_string());
    }

    pub fn slug_for(&self, canonical_id: &str) -> Option<String> {
        self.slug_by_id.get(canonical_id).map(|s| s.clone())
    }

    pub fn known_slugs(&self) -> usize {
        self.slug_by_id.len()
    }

    /// Entries held across all tiers
    pub fn cached_entries(&self) -> usize {
        self.listings.len() + self.streams.len() + self.resolutions.len() + self.terms.len()
    }

    /// Drops every cached value and the reverse index
    pub fn clear(&self) {
        self.listings.clear();
        self.streams.clear();
        self.resolutions.clear();
        self.terms.clear();
        self.slug_by_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_stable() {
        assert_eq!(cache_key("cat", &["filmi2k-drama", "2"]), "cat:filmi2k-drama:2");
        assert_eq!(cache_key("streams", &["tt0000001"]), "streams:tt0000001");
        assert_eq!(cache_key("noop", &[]), "noop");
    }

    #[test]
    fn test_ttl_cache_hit() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("k".to_string(), 7u64);
        assert_eq!(cache.get("k"), Some(7));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_ttl_cache_expired_entry_is_evicted() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("k".to_string(), "v".to_string());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_sweeps_expired_entries() {
        let cache = TtlCache::new(Duration::ZERO);
        for i in 0..10_000 {
            cache.insert(format!("query:{}", i), i);
        }
        // Only the entry inserted after the last sweep remains
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sweep_waits_for_the_period() {
        let cache = TtlCache::new(Duration::from_millis(50));
        for i in 0..10u64 {
            cache.insert(format!("page:{}", i), i);
        }
        assert_eq!(cache.len(), 10);

        std::thread::sleep(Duration::from_millis(80));
        cache.insert("page:10".to_string(), 10);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("page:10"), Some(10));
    }

    #[test]
    fn test_purge_expired() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.entries.insert(
            "stale".to_string(),
            Entry {
                value: 1u64,
                expires_at: Instant::now(),
            },
        );
        cache.purge_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ttl_cache_last_write_wins() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("k".to_string(), 1u64);
        cache.insert("k".to_string(), 2u64);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reverse_index() {
        let state = ScraperState::new(Duration::from_secs(60), Duration::from_secs(600));
        assert_eq!(state.slug_for("tt1375666"), None);

        state.remember_slug("tt1375666", "inception-2010");
        state.remember_slug("tt1375666", "inception-2010-bg-audio");
        assert_eq!(
            state.slug_for("tt1375666").as_deref(),
            Some("inception-2010-bg-audio")
        );
        assert_eq!(state.known_slugs(), 1);
    }

    #[test]
    fn test_state_tiers_use_their_own_ttl() {
        let state = ScraperState::new(Duration::from_secs(60), Duration::from_secs(600));
        assert_eq!(state.listings.ttl(), Duration::from_secs(60));
        assert_eq!(state.streams.ttl(), Duration::from_secs(60));
        assert_eq!(state.resolutions.ttl(), Duration::from_secs(600));
        assert_eq!(state.terms.ttl(), Duration::from_secs(600));
    }

    #[test]
    fn test_state_clear() {
        let state = ScraperState::new(Duration::from_secs(60), Duration::from_secs(600));
        state.terms.insert("t".to_string(), 3);
        state.listings.insert("l".to_string(), Vec::new());
        state.remember_slug("tt1", "slug");
        assert_eq!(state.cached_entries(), 2);
        state.clear();
        assert_eq!(state.cached_entries(), 0);
        assert!(state.terms.is_empty());
        assert_eq!(state.known_slugs(), 0);
    }
}
