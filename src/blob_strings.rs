//! # Blob strings cache
//!
//! Caches strings materialized from blob content, keyed by the container they
//! were read from and the blob's handle inside it.
//!
//! ## Key derivation
//!
//! ```text
//!    63                32 31                 0
//!   ┌────────────────────┬────────────────────┐
//!   │  identity          │  0                 │   identity << 32
//!   └────────────────────┴────────────────────┘
//!                        XOR
//!   ┌─────────────────────────────────────────┐
//!   │  handle                                 │
//!   └─────────────────────────────────────────┘
//!                         =
//!   ┌─────────────────────────────────────────┐
//!   │  CacheKey                               │
//!   └─────────────────────────────────────────┘
//! ```
//!
//! Handles are only unique inside one container instance. When a container
//! is reopened or compacted it gets a new identity and may reuse old handle
//! numbers for different content. Every entry therefore remembers the
//! identity it was cached under, and a lookup whose container identity
//! differs is a miss. Nothing is flushed when a container is replaced; dead
//! entries age out through normal eviction.
//!
//! For one identity the XOR is a bijection, so two handles of the same
//! container never share a key. Keys collide only across identities, e.g.
//! `(0, 1 << 32)` and `(1, 0)`, and only for handles at or above 2^32. The
//! colliding entries overwrite each other and the identity check turns the
//! loser into a miss. Handles of real blob stores stay far below 2^32, so
//! this is accepted rather than avoided.
//!
//! ## Example Usage
//!
//! ```
//! use blobcache::blob_strings::StringBlobCache;
//! use blobcache::traits::BlobContainer;
//!
//! struct Vault { identity: u32 }
//!
//! impl BlobContainer for Vault {
//!     fn identity(&self) -> u32 { self.identity }
//! }
//!
//! let cache = StringBlobCache::new(1024);
//! let vault = Vault { identity: 1 };
//!
//! cache.cache_object(&vault, 42, "hello");
//! assert_eq!(cache.get_object(&vault, 42).as_deref(), Some("hello"));
//!
//! // Same handle, reopened vault: stale entry is not served
//! let reopened = Vault { identity: 2 };
//! assert!(cache.get_object(&reopened, 42).is_none());
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::BlobStringsCacheConfig;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::SoftCacheMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::MetricsSnapshotProvider;
use crate::store::soft::SoftLongCache;
use crate::traits::{BlobContainer, MemoryPressure, SoftCache};

/// Composite cache key: `handle XOR (identity << 32)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(u64);

impl CacheKey {
    /// ```
    /// use blobcache::blob_strings::CacheKey;
    ///
    /// assert_eq!(CacheKey::derive(1, 10).get(), 10 | 1 << 32);
    /// assert_eq!(CacheKey::derive(0, 10).get(), 10);
    /// ```
    #[inline]
    pub fn derive(identity: u32, handle: u64) -> Self {
        Self(handle ^ (u64::from(identity) << 32))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A cached string together with the identity of the container it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    identity: u32,
    value: Arc<str>,
}

impl CacheEntry {
    pub fn new(identity: u32, value: Arc<str>) -> Self {
        Self { identity, value }
    }

    pub fn identity(&self) -> u32 {
        self.identity
    }

    pub fn value(&self) -> &Arc<str> {
        &self.value
    }
}

/// Bounded cache of blob strings with stale-container protection.
///
/// Shared by reference (or `Arc`) between all readers of a store; every
/// method takes `&self`. The cache holds no locks of its own; all
/// synchronization lives in the underlying [`SoftCache`].
pub struct StringBlobCache<S = SoftLongCache<CacheEntry>> {
    store: S,
}

impl StringBlobCache {
    /// Creates a cache holding at most `capacity` strings.
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "blob strings cache created");
        Self::with_store(SoftLongCache::new(capacity))
    }

    /// Creates a cache sized by `config`.
    pub fn from_config(config: &BlobStringsCacheConfig) -> Self {
        Self::new(config.cache_size)
    }
}

impl<S> StringBlobCache<S>
where
    S: SoftCache<CacheEntry>,
{
    /// Wraps an existing store.
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    /// Validates a looked-up entry against the container being queried.
    fn accept(entry: Option<Arc<CacheEntry>>, identity: u32, handle: u64) -> Option<Arc<str>> {
        let Some(entry) = entry else {
            trace!(handle, "blob string cache miss");
            return None;
        };
        if entry.identity != identity {
            trace!(
                handle,
                cached_identity = entry.identity,
                identity,
                "blob string cached for another container instance"
            );
            return None;
        }
        trace!(handle, "blob string cache hit");
        Some(Arc::clone(&entry.value))
    }

    /// Looks up the string for `handle` without raising its eviction priority.
    pub fn try_key<C>(&self, container: &C, handle: u64) -> Option<Arc<str>>
    where
        C: BlobContainer + ?Sized,
    {
        let identity = container.identity();
        let key = CacheKey::derive(identity, handle);
        Self::accept(self.store.try_key(key.get()), identity, handle)
    }

    /// Looks up the string for `handle` and marks it recently used.
    pub fn get_object<C>(&self, container: &C, handle: u64) -> Option<Arc<str>>
    where
        C: BlobContainer + ?Sized,
    {
        let identity = container.identity();
        let key = CacheKey::derive(identity, handle);
        Self::accept(self.store.get_object(key.get()), identity, handle)
    }

    /// Caches `value` for `handle`, replacing whatever the key held.
    pub fn cache_object<C>(&self, container: &C, handle: u64, value: impl Into<Arc<str>>)
    where
        C: BlobContainer + ?Sized,
    {
        let identity = container.identity();
        let key = CacheKey::derive(identity, handle);
        self.store
            .cache_object(key.get(), CacheEntry::new(identity, value.into()));
    }

    /// Cumulative hits / lookups of the underlying store, 0 before any lookup.
    ///
    /// An entry rejected for belonging to another container still counts as a
    /// store hit.
    pub fn hit_rate(&self) -> f64 {
        self.store.hit_rate()
    }

    /// Forwards a memory-pressure signal to the store.
    pub fn reclaim(&self, pressure: MemoryPressure) -> usize {
        self.store.reclaim(pressure)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Emit a `debug!` line summarising the cache.
    pub fn log_metrics(&self) {
        debug!(
            hit_rate = %format!("{:.1}%", self.hit_rate() * 100.0),
            entries = self.len(),
            capacity = self.capacity(),
            "blob strings cache metrics"
        );
    }
}

#[cfg(feature = "metrics")]
impl<S> StringBlobCache<S>
where
    S: SoftCache<CacheEntry> + MetricsSnapshotProvider<SoftCacheMetricsSnapshot>,
{
    pub fn metrics_snapshot(&self) -> SoftCacheMetricsSnapshot {
        self.store.snapshot()
    }
}

impl Default for StringBlobCache {
    fn default() -> Self {
        Self::from_config(&BlobStringsCacheConfig::default())
    }
}

impl<S> fmt::Debug for StringBlobCache<S>
where
    S: SoftCache<CacheEntry>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringBlobCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("hit_rate", &self.hit_rate())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SoftCacheBuilder;

    struct Vault(u32);

    impl BlobContainer for Vault {
        fn identity(&self) -> u32 {
            self.0
        }
    }

    fn single_chunk(capacity: usize) -> StringBlobCache {
        StringBlobCache::with_store(SoftCacheBuilder::new(capacity).chunks(1).build())
    }

    mod key_derivation {
        use super::*;

        #[test]
        fn identity_lands_in_high_bits() {
            assert_eq!(CacheKey::derive(0xabcd, 0).get(), 0xabcd_0000_0000);
            assert_eq!(CacheKey::derive(u32::MAX, 0).get(), 0xffff_ffff_0000_0000);
        }

        #[test]
        fn handle_is_xored_not_or_ed() {
            let handle = 3u64 << 32 | 7;
            assert_eq!(CacheKey::derive(1, handle).get(), 2u64 << 32 | 7);
        }

        #[test]
        fn different_identities_give_different_keys_for_same_handle() {
            for handle in [0u64, 1, 30, u32::MAX as u64, 1 << 40] {
                assert_ne!(CacheKey::derive(1, handle), CacheKey::derive(2, handle));
            }
        }

        #[test]
        fn collisions_only_happen_across_identities() {
            assert_eq!(CacheKey::derive(0, 1 << 32), CacheKey::derive(1, 0));
            assert_ne!(CacheKey::derive(1, 5), CacheKey::derive(1, 5 ^ 1 << 32));

            let keys: std::collections::HashSet<_> = [0u64, 1, 1 << 32, 1 << 33, u64::MAX]
                .iter()
                .map(|&h| CacheKey::derive(7, h))
                .collect();
            assert_eq!(keys.len(), 5);
        }
    }

    mod lookups {
        use super::*;

        #[test]
        fn cached_value_is_returned_by_both_lookups() {
            let cache = StringBlobCache::new(64);
            let vault = Vault(1);
            cache.cache_object(&vault, 10, "ten");

            assert_eq!(cache.get_object(&vault, 10).as_deref(), Some("ten"));
            assert_eq!(cache.try_key(&vault, 10).as_deref(), Some("ten"));
        }

        #[test]
        fn unknown_handle_is_absent() {
            let cache = StringBlobCache::new(64);
            let vault = Vault(1);
            assert!(cache.get_object(&vault, u64::MAX).is_none());
            assert!(cache.try_key(&vault, 0).is_none());
        }

        #[test]
        fn overwrite_keeps_latest_value() {
            let cache = StringBlobCache::new(64);
            let vault = Vault(3);
            cache.cache_object(&vault, 1, "v1");
            cache.cache_object(&vault, 1, String::from("v2"));
            assert_eq!(cache.get_object(&vault, 1).as_deref(), Some("v2"));
            assert_eq!(cache.len(), 1);
        }

        #[test]
        fn other_identity_never_sees_value() {
            let cache = StringBlobCache::new(64);
            cache.cache_object(&Vault(1), 30, "c");

            let other = Vault(2);
            assert!(cache.get_object(&other, 30).is_none());
            assert!(cache.try_key(&other, 30).is_none());
        }

        #[test]
        fn colliding_key_from_other_identity_is_rejected() {
            let cache = StringBlobCache::new(64);
            // Identity 0, handle 1 << 32 and identity 1, handle 0 share a key.
            cache.cache_object(&Vault(0), 1 << 32, "from vault 0");

            assert!(cache.get_object(&Vault(1), 0).is_none());
            assert!(cache.try_key(&Vault(1), 0).is_none());
            assert_eq!(
                cache.get_object(&Vault(0), 1 << 32).as_deref(),
                Some("from vault 0")
            );
        }

        #[test]
        fn works_through_trait_objects() {
            let cache = StringBlobCache::new(16);
            let vault: Arc<dyn BlobContainer + Send + Sync> = Arc::new(Vault(8));
            cache.cache_object(vault.as_ref(), 2, "two");
            assert_eq!(cache.try_key(vault.as_ref(), 2).as_deref(), Some("two"));
        }
    }

    mod statistics {
        use super::*;

        #[test]
        fn fresh_cache_reports_zero() {
            assert_eq!(StringBlobCache::new(16).hit_rate(), 0.0);
        }

        #[test]
        fn hit_rate_accumulates_over_both_lookups() {
            let cache = StringBlobCache::new(16);
            let vault = Vault(1);
            cache.cache_object(&vault, 1, "one");

            cache.get_object(&vault, 1);
            cache.try_key(&vault, 1);
            cache.get_object(&vault, 2);
            assert!((cache.hit_rate() - 2.0 / 3.0).abs() < 1e-9);

            cache.try_key(&vault, 3);
            assert_eq!(cache.hit_rate(), 0.5);
        }

        #[test]
        fn caching_does_not_count_as_lookup() {
            let cache = StringBlobCache::new(16);
            cache.cache_object(&Vault(1), 1, "one");
            assert_eq!(cache.hit_rate(), 0.0);
            assert_eq!(cache.store().attempts(), 0);
        }

        #[cfg(feature = "metrics")]
        #[test]
        fn snapshot_reflects_store() {
            let cache = single_chunk(2);
            let vault = Vault(1);
            cache.cache_object(&vault, 1, "a");
            cache.cache_object(&vault, 2, "b");
            cache.cache_object(&vault, 3, "c");
            cache.get_object(&vault, 3);

            let snapshot = cache.metrics_snapshot();
            assert_eq!(snapshot.evictions, 1);
            assert_eq!(snapshot.hits, 1);
            assert_eq!(snapshot.cache_len, 2);
        }
    }

    mod eviction {
        use super::*;

        #[test]
        fn capacity_two_scenario() {
            let cache = single_chunk(2);
            let x = Vault(1);

            cache.cache_object(&x, 10, "a");
            cache.cache_object(&x, 20, "b");
            assert_eq!(cache.try_key(&x, 10).as_deref(), Some("a"));
            assert_eq!(cache.try_key(&x, 20).as_deref(), Some("b"));

            cache.cache_object(&x, 30, "c");
            let survivors = [10u64, 20]
                .iter()
                .filter(|&&h| cache.try_key(&x, h).is_some())
                .count();
            assert!(survivors < 2);
            assert_eq!(cache.get_object(&x, 30).as_deref(), Some("c"));

            let y = Vault(2);
            assert!(cache.get_object(&y, 30).is_none());
            // still physically present for X
            assert_eq!(cache.try_key(&x, 30).as_deref(), Some("c"));
        }

        #[test]
        fn get_object_protects_from_eviction_but_try_key_does_not() {
            let cache = single_chunk(2);
            let x = Vault(1);

            cache.cache_object(&x, 1, "one");
            cache.cache_object(&x, 2, "two");
            cache.get_object(&x, 1);
            cache.cache_object(&x, 3, "three");
            assert!(cache.try_key(&x, 1).is_some());
            assert!(cache.try_key(&x, 2).is_none());

            cache.try_key(&x, 1);
            cache.cache_object(&x, 4, "four");
            assert!(cache.try_key(&x, 1).is_none());
            assert!(cache.try_key(&x, 3).is_some());
        }

        #[test]
        fn stale_entries_age_out_normally() {
            let cache = single_chunk(4);
            let old = Vault(1);
            let new = Vault(2);
            for h in 0..4 {
                cache.cache_object(&old, h, format!("old {h}"));
            }
            for h in 0..4 {
                assert!(cache.get_object(&new, h).is_none());
                cache.cache_object(&new, h, format!("new {h}"));
            }
            assert_eq!(cache.len(), 4);
            for h in 0..4 {
                assert!(cache.try_key(&old, h).is_none());
                assert_eq!(
                    cache.try_key(&new, h).as_deref(),
                    Some(format!("new {h}").as_str())
                );
            }
        }

        #[test]
        fn reclaim_turns_entries_into_misses() {
            let cache = StringBlobCache::new(64);
            let vault = Vault(1);
            cache.cache_object(&vault, 1, "one");
            cache.get_object(&vault, 1);

            assert_eq!(cache.reclaim(MemoryPressure::Critical), 1);
            assert!(cache.get_object(&vault, 1).is_none());
            assert_eq!(cache.hit_rate(), 0.5);
        }
    }

    #[test]
    fn from_config_uses_cache_size() {
        let cache = StringBlobCache::from_config(&BlobStringsCacheConfig::new(100));
        assert_eq!(cache.capacity(), 100);
        assert_eq!(StringBlobCache::default().capacity(), 4096);
    }

    #[test]
    fn is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StringBlobCache>();
    }
}
