//! Trait seams between the blob strings cache and its collaborators.
//!
//! ```text
//!   ┌──────────────────────┐      identity()      ┌──────────────────────┐
//!   │   StringBlobCache    │ ───────────────────► │  BlobContainer       │
//!   │                      │                      │  (backing store)     │
//!   │                      │   try_key/get_object │                      │
//!   │                      │   cache_object       └──────────────────────┘
//!   │                      │ ───────────────────► ┌──────────────────────┐
//!   └──────────────────────┘                      │  SoftCache<V>        │
//!                                                 │  (SoftLongCache)     │
//!                                                 └──────────────────────┘
//! ```

use std::sync::Arc;

/// How hard the owner wants the cache to give memory back.
///
/// See [`SoftLongCache::reclaim`](crate::store::soft::SoftLongCache::reclaim).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPressure {
    /// Drop the least recently used half of every chunk.
    Moderate,
    /// Drop everything.
    Critical,
}

/// A backing storage container whose content the cache mirrors.
///
/// The identity must stay fixed for the lifetime of one container instance
/// and differ between any two instances alive at the same time. A reopened
/// or compacted container gets a new identity, which turns every entry
/// cached for the old instance into a miss.
pub trait BlobContainer {
    fn identity(&self) -> u32;
}

impl<T: BlobContainer + ?Sized> BlobContainer for &T {
    fn identity(&self) -> u32 {
        (**self).identity()
    }
}

impl<T: BlobContainer + ?Sized> BlobContainer for Arc<T> {
    fn identity(&self) -> u32 {
        (**self).identity()
    }
}

/// Bounded `u64`-keyed cache that may drop entries on its own.
///
/// Implementations must be safe to call from many threads at once and must
/// serialize their own eviction bookkeeping. A value may disappear between
/// insert and lookup; that shows up as a plain miss.
pub trait SoftCache<V>: Send + Sync {
    /// Lookup that does not count as a use for eviction purposes.
    fn try_key(&self, key: u64) -> Option<Arc<V>>;

    /// Lookup that marks the entry as recently used.
    fn get_object(&self, key: u64) -> Option<Arc<V>>;

    /// Insert or overwrite; may evict another entry.
    fn cache_object(&self, key: u64, value: V);

    /// Cumulative hits / lookups, 0 before any lookup.
    fn hit_rate(&self) -> f64;

    /// Give memory back. Returns the number of entries dropped.
    fn reclaim(&self, _pressure: MemoryPressure) -> usize {
        0
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;
}
