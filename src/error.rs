//! Error types for the blobcache library.
//!
//! Cache lookups and inserts are infallible: a miss is `None`, never an error.
//! The only fallible surface is configuration.
//!
//! ## Example Usage
//!
//! ```
//! use blobcache::builder::SoftCacheBuilder;
//! use blobcache::error::ConfigError;
//!
//! let bad = SoftCacheBuilder::new(0).try_build::<String>();
//! assert_eq!(bad.unwrap_err(), ConfigError::ZeroCapacity);
//! ```

use thiserror::Error;

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`SoftCacheBuilder::try_build`](crate::builder::SoftCacheBuilder::try_build)
/// and [`BlobStringsCacheConfig::validate`](crate::config::BlobStringsCacheConfig::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A cache that can hold nothing was requested.
    #[error("cache capacity must be > 0")]
    ZeroCapacity,

    /// More chunks than entries would leave some chunks with no room.
    #[error("chunk count {chunks} exceeds cache capacity {capacity}")]
    TooManyChunks { chunks: usize, capacity: usize },

    /// A configuration value could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
