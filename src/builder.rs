//! Builder for [`SoftLongCache`].
//!
//! ## Example
//!
//! ```rust
//! use blobcache::builder::SoftCacheBuilder;
//!
//! let cache = SoftCacheBuilder::new(256).chunks(4).build::<String>();
//! assert_eq!(cache.capacity(), 256);
//! assert_eq!(cache.chunk_count(), 4);
//!
//! // Fallible variant for user-supplied parameters
//! assert!(SoftCacheBuilder::new(2).chunks(8).try_build::<String>().is_err());
//! ```

use crate::error::ConfigError;
use crate::store::soft::{DEFAULT_SIZE, SoftLongCache, default_chunk_count};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftCacheBuilder {
    capacity: usize,
    chunks: Option<usize>,
}

impl SoftCacheBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            chunks: None,
        }
    }

    /// Overrides the default chunk count (`clamp(capacity / 1024, 1, 16)`).
    pub fn chunks(mut self, chunks: usize) -> Self {
        self.chunks = Some(chunks);
        self
    }

    fn chunk_count(&self) -> usize {
        self.chunks
            .unwrap_or_else(|| default_chunk_count(self.capacity))
    }

    /// Builds the cache, clamping the chunk count into `[1, capacity]`.
    pub fn build<V>(self) -> SoftLongCache<V> {
        SoftLongCache::with_chunks(self.capacity, self.chunk_count())
    }

    /// Builds the cache, rejecting parameters `build` would silently clamp.
    pub fn try_build<V>(self) -> Result<SoftLongCache<V>, ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let chunks = self.chunk_count();
        if chunks == 0 {
            return Err(ConfigError::Invalid {
                key: "chunks",
                value: chunks.to_string(),
            });
        }
        if chunks > self.capacity {
            return Err(ConfigError::TooManyChunks {
                chunks,
                capacity: self.capacity,
            });
        }
        Ok(SoftLongCache::with_chunks(self.capacity, chunks))
    }
}

impl Default for SoftCacheBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_builder_matches_default_cache() {
        let cache = SoftCacheBuilder::default().build::<u64>();
        assert_eq!(cache.capacity(), DEFAULT_SIZE);
        assert_eq!(cache.chunk_count(), 4);
    }

    #[test]
    fn build_clamps_chunks() {
        let cache = SoftCacheBuilder::new(3).chunks(10).build::<u64>();
        assert_eq!(cache.chunk_count(), 3);

        let cache = SoftCacheBuilder::new(30).chunks(0).build::<u64>();
        assert_eq!(cache.chunk_count(), 1);
    }

    #[test]
    fn try_build_rejects_zero_capacity() {
        let err = SoftCacheBuilder::new(0).try_build::<u64>().unwrap_err();
        assert_eq!(err, ConfigError::ZeroCapacity);
    }

    #[test]
    fn try_build_rejects_bad_chunk_counts() {
        let err = SoftCacheBuilder::new(4).chunks(5).try_build::<u64>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::TooManyChunks {
                chunks: 5,
                capacity: 4
            }
        );
        assert!(SoftCacheBuilder::new(4).chunks(0).try_build::<u64>().is_err());
    }

    #[test]
    fn try_build_accepts_valid_parameters() {
        let cache = SoftCacheBuilder::new(64).chunks(8).try_build::<u64>().unwrap();
        assert_eq!(cache.chunk_count(), 8);
        assert_eq!(cache.capacity(), 64);
    }
}
