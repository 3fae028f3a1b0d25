//! Chunk selection for the chunked soft cache.
//!
//! Maps a `u64` cache key to one of `chunks` independently locked chunks of
//! [`SoftLongCache`](crate::store::soft::SoftLongCache).
//!
//! ## Architecture
//!
//! ```text
//!   key: u64
//!     │
//!     ▼
//!   key & i64::MAX          (drop the sign bit so high-identity keys stay positive)
//!     │
//!     ▼
//!   % chunks                → chunk index in [0, chunks)
//!
//!   ┌─────────┬─────────┬─────────┬─────────┐
//!   │ Chunk 0 │ Chunk 1 │ Chunk 2 │ Chunk 3 │
//!   └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! Cache keys are already well mixed in their low bits (content handles), so
//! no extra hashing happens here. Keys that differ only in identity bits map
//! to chunks by the full value, which still spreads them.
//!
//! ## Example Usage
//!
//! ```
//! use blobcache::ds::ChunkSelector;
//!
//! let selector = ChunkSelector::new(4);
//! assert_eq!(selector.chunk_for_key(10), 2);
//! assert_eq!(selector.chunk_for_key(u64::MAX), (i64::MAX as u64 % 4) as usize);
//! ```

/// Deterministic key-to-chunk mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSelector {
    chunks: usize,
}

impl ChunkSelector {
    /// Creates a selector for `chunks` chunks.
    ///
    /// The chunk count is clamped to at least 1.
    ///
    /// ```
    /// use blobcache::ds::ChunkSelector;
    ///
    /// assert_eq!(ChunkSelector::new(0).chunk_count(), 1);
    /// ```
    pub fn new(chunks: usize) -> Self {
        Self {
            chunks: chunks.max(1),
        }
    }

    /// Returns the number of chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Maps a key to a chunk index in `[0, chunks)`.
    #[inline]
    pub fn chunk_for_key(&self, key: u64) -> usize {
        ((key & i64::MAX as u64) % self.chunks as u64) as usize
    }
}

impl Default for ChunkSelector {
    /// Creates a single-chunk selector.
    fn default() -> Self {
        Self::new(1)
    }
}
