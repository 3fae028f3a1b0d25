//! Chunked, capacity-bounded cache that yields under memory pressure.
//!
//! `SoftLongCache` is the bounded store behind
//! [`StringBlobCache`](crate::blob_strings::StringBlobCache). Keys are `u64`,
//! values are shared as `Arc<V>`.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────────────┐
//!   │                         SoftLongCache<V>                              │
//!   │                                                                       │
//!   │   ChunkSelector: (key & i64::MAX) % chunks                            │
//!   │         │                                                             │
//!   │         ▼                                                             │
//!   │   ┌──────────────────┬──────────────────┬──────────────────┐          │
//!   │   │ RwLock<Option<   │ RwLock<Option<   │ RwLock<Option<   │   ...    │
//!   │   │   LruCore<V>>>   │   LruCore<V>>>   │   LruCore<V>>>   │          │
//!   │   │  (lazy, may be   │                  │                  │          │
//!   │   │   reclaimed)     │                  │                  │          │
//!   │   └──────────────────┴──────────────────┴──────────────────┘          │
//!   │                                                                       │
//!   │   counters: attempts / hits / inserts / updates / evictions /         │
//!   │             removes / reclaimed          (AtomicU64, lock-free)       │
//!   └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each chunk holds at most `capacity / chunks` entries and evicts its own
//! least recently used entry when full, so the whole cache never exceeds its
//! configured capacity.
//!
//! ## Memory pressure
//!
//! There is no runtime that clears entries on its own, so the owner calls
//! [`SoftLongCache::reclaim`] when it learns memory is tight:
//!
//! | Pressure   | Effect                                          |
//! |------------|-------------------------------------------------|
//! | `Moderate` | each chunk evicts its least recently used half  |
//! | `Critical` | every chunk is dropped; next insert recreates it|
//!
//! Reclaimed entries surface as ordinary misses. Statistics are kept.
//!
//! ## Concurrency Model
//!
//! | Method         | Lock              |
//! |----------------|-------------------|
//! | `try_key`      | chunk read        |
//! | `get_object`   | chunk write       |
//! | `cache_object` | chunk write       |
//! | `remove`       | chunk write       |
//! | `reclaim`      | each chunk write  |
//! | `hit_rate`     | none (atomics)    |

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::ds::ChunkSelector;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::SoftCacheMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::MetricsSnapshotProvider;
use crate::policy::lru::LruCore;
use crate::traits::{MemoryPressure, SoftCache};

/// Default maximum entry count.
pub const DEFAULT_SIZE: usize = 0x1000;

/// Entries per chunk the default chunk count aims for.
const TARGET_CHUNK_SIZE: usize = 1024;

/// Upper bound on the default chunk count.
const MAX_DEFAULT_CHUNKS: usize = 16;

/// Chunk count used when none is configured: `clamp(capacity / 1024, 1, 16)`.
///
/// ```
/// use blobcache::store::soft::default_chunk_count;
///
/// assert_eq!(default_chunk_count(2), 1);
/// assert_eq!(default_chunk_count(4096), 4);
/// assert_eq!(default_chunk_count(1 << 20), 16);
/// ```
pub fn default_chunk_count(capacity: usize) -> usize {
    (capacity / TARGET_CHUNK_SIZE).clamp(1, MAX_DEFAULT_CHUNKS)
}

#[derive(Debug, Default)]
struct SoftCacheCounters {
    attempts: AtomicU64,
    hits: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
    evictions: AtomicU64,
    removes: AtomicU64,
    reclaimed: AtomicU64,
}

impl SoftCacheCounters {
    fn record_lookup(&self, hit: bool) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn add(counter: &AtomicU64, n: usize) {
        if n > 0 {
            counter.fetch_add(n as u64, Ordering::Relaxed);
        }
    }

    fn reset(&self) {
        for counter in [
            &self.attempts,
            &self.hits,
            &self.inserts,
            &self.updates,
            &self.evictions,
            &self.removes,
            &self.reclaimed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Thread-safe bounded cache split into lazily allocated LRU chunks.
///
/// # Example
///
/// ```
/// use blobcache::store::soft::SoftLongCache;
///
/// let cache: SoftLongCache<String> = SoftLongCache::new(128);
/// cache.cache_object(7, "seven".to_string());
///
/// assert_eq!(cache.get_object(7).as_deref().map(String::as_str), Some("seven"));
/// assert!(cache.try_key(8).is_none());
/// assert_eq!(cache.hit_rate(), 0.5);
/// ```
pub struct SoftLongCache<V> {
    chunks: Vec<RwLock<Option<LruCore<V>>>>,
    selector: ChunkSelector,
    chunk_capacity: usize,
    capacity: usize,
    counters: SoftCacheCounters,
}

impl<V> SoftLongCache<V> {
    /// Creates a cache holding at most `capacity` entries with the default
    /// chunk count.
    pub fn new(capacity: usize) -> Self {
        Self::with_chunks(capacity, default_chunk_count(capacity))
    }

    /// Creates a cache with an explicit chunk count.
    ///
    /// The chunk count is clamped to `[1, capacity]` so every chunk can hold
    /// at least one entry. A capacity of 0 creates a cache that stores nothing.
    pub fn with_chunks(capacity: usize, chunks: usize) -> Self {
        let chunk_count = chunks.clamp(1, capacity.max(1));
        let chunk_capacity = capacity / chunk_count;

        debug!(
            capacity,
            chunks = chunk_count,
            chunk_capacity,
            "soft cache created"
        );

        Self {
            chunks: (0..chunk_count).map(|_| RwLock::new(None)).collect(),
            selector: ChunkSelector::new(chunk_count),
            chunk_capacity,
            capacity,
            counters: SoftCacheCounters::default(),
        }
    }

    #[inline]
    fn chunk(&self, key: u64) -> &RwLock<Option<LruCore<V>>> {
        &self.chunks[self.selector.chunk_for_key(key)]
    }

    /// Looks up `key` without changing its eviction priority.
    pub fn try_key(&self, key: u64) -> Option<Arc<V>> {
        let result = self
            .chunk(key)
            .read()
            .as_ref()
            .and_then(|lru| lru.peek(key).cloned());
        self.counters.record_lookup(result.is_some());
        result
    }

    /// Looks up `key` and marks it most recently used.
    pub fn get_object(&self, key: u64) -> Option<Arc<V>> {
        let result = self
            .chunk(key)
            .write()
            .as_mut()
            .and_then(|lru| lru.get(key).cloned());
        self.counters.record_lookup(result.is_some());
        result
    }

    /// Inserts or replaces the value for `key`.
    pub fn cache_object(&self, key: u64, value: V) {
        self.cache_arc(key, Arc::new(value));
    }

    /// Inserts a pre-wrapped value, sharing the same `Arc` with the caller.
    pub fn cache_arc(&self, key: u64, value: Arc<V>) {
        if self.chunk_capacity == 0 {
            return;
        }

        let mut guard = self.chunk(key).write();
        let lru = guard.get_or_insert_with(|| LruCore::new(self.chunk_capacity));

        if !lru.contains(key) && lru.len() >= lru.capacity() && lru.pop_lru().is_some() {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }

        let counter = match lru.insert(key, value) {
            Some(_) => &self.counters.updates,
            None => &self.counters.inserts,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Removes `key`, returning its value if it was cached.
    pub fn remove(&self, key: u64) -> Option<Arc<V>> {
        let removed = self.chunk(key).write().as_mut().and_then(|lru| lru.remove(key));
        if removed.is_some() {
            self.counters.removes.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Drops every chunk and resets statistics.
    pub fn clear(&self) {
        for chunk in &self.chunks {
            *chunk.write() = None;
        }
        self.counters.reset();
        debug!("soft cache cleared");
    }

    /// Gives memory back under pressure. Returns the number of entries dropped.
    pub fn reclaim(&self, pressure: MemoryPressure) -> usize {
        let mut reclaimed = 0;
        for chunk in &self.chunks {
            let mut guard = chunk.write();
            reclaimed += match pressure {
                MemoryPressure::Moderate => guard
                    .as_mut()
                    .map_or(0, |lru| lru.shrink_to(lru.len() / 2)),
                MemoryPressure::Critical => guard.take().map_or(0, |lru| lru.len()),
            };
        }
        SoftCacheCounters::add(&self.counters.reclaimed, reclaimed);
        debug!(?pressure, reclaimed, "soft cache reclaimed entries");
        reclaimed
    }

    /// Cumulative hits / lookups; 0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let attempts = self.attempts();
        if attempts == 0 {
            0.0
        } else {
            self.hits() as f64 / attempts as f64
        }
    }

    /// Total lookups through `try_key` and `get_object`.
    pub fn attempts(&self) -> u64 {
        self.counters.attempts.load(Ordering::Relaxed)
    }

    /// Lookups that found a value.
    pub fn hits(&self) -> u64 {
        self.counters.hits.load(Ordering::Relaxed)
    }

    /// Number of cached entries across all chunks.
    pub fn len(&self) -> usize {
        self.chunks
            .iter()
            .map(|chunk| chunk.read().as_ref().map_or(0, LruCore::len))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured maximum entry count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Emit a `debug!` line summarising the cache statistics.
    pub fn log_metrics(&self) {
        debug!(
            attempts = self.attempts(),
            hits = self.hits(),
            hit_rate = %format!("{:.1}%", self.hit_rate() * 100.0),
            evictions = self.counters.evictions.load(Ordering::Relaxed),
            reclaimed = self.counters.reclaimed.load(Ordering::Relaxed),
            entries = self.len(),
            capacity = self.capacity,
            "soft cache metrics"
        );
    }
}

#[cfg(feature = "metrics")]
impl<V> SoftLongCache<V> {
    pub fn metrics_snapshot(&self) -> SoftCacheMetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        SoftCacheMetricsSnapshot {
            attempts: load(&self.counters.attempts),
            hits: load(&self.counters.hits),
            inserts: load(&self.counters.inserts),
            updates: load(&self.counters.updates),
            evictions: load(&self.counters.evictions),
            removes: load(&self.counters.removes),
            reclaimed: load(&self.counters.reclaimed),
            cache_len: self.len(),
            capacity: self.capacity,
            chunks: self.chunks.len(),
        }
    }
}

#[cfg(feature = "metrics")]
impl<V> MetricsSnapshotProvider<SoftCacheMetricsSnapshot> for SoftLongCache<V> {
    fn snapshot(&self) -> SoftCacheMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<V> SoftCache<V> for SoftLongCache<V>
where
    V: Send + Sync,
{
    fn try_key(&self, key: u64) -> Option<Arc<V>> {
        SoftLongCache::try_key(self, key)
    }

    fn get_object(&self, key: u64) -> Option<Arc<V>> {
        SoftLongCache::get_object(self, key)
    }

    fn cache_object(&self, key: u64, value: V) {
        SoftLongCache::cache_object(self, key, value)
    }

    fn hit_rate(&self) -> f64 {
        SoftLongCache::hit_rate(self)
    }

    fn reclaim(&self, pressure: MemoryPressure) -> usize {
        SoftLongCache::reclaim(self, pressure)
    }

    fn len(&self) -> usize {
        SoftLongCache::len(self)
    }

    fn capacity(&self) -> usize {
        SoftLongCache::capacity(self)
    }
}

impl<V> Default for SoftLongCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

impl<V> fmt::Debug for SoftLongCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftLongCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("chunks", &self.chunks.len())
            .finish_non_exhaustive()
    }
}
