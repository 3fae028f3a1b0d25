//! Configuration for the blob strings cache.
//!
//! The cache never looks configuration up by itself. Whoever assembles the
//! storage engine builds a [`BlobStringsCacheConfig`] (deserialized, from the
//! environment, or by hand) and passes it to
//! [`StringBlobCache::from_config`](crate::blob_strings::StringBlobCache::from_config).
//!
//! | Key                       | Env var                   | Default |
//! |---------------------------|---------------------------|---------|
//! | `blob-strings-cache-size` | `BLOB_STRINGS_CACHE_SIZE` | 4096    |

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::store::soft::DEFAULT_SIZE;

/// Environment variable read by [`BlobStringsCacheConfig::from_env`].
pub const CACHE_SIZE_ENV: &str = "BLOB_STRINGS_CACHE_SIZE";

const CACHE_SIZE_KEY: &str = "blob-strings-cache-size";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobStringsCacheConfig {
    /// Maximum number of cached strings.
    #[serde(rename = "blob-strings-cache-size")]
    pub cache_size: usize,
}

impl BlobStringsCacheConfig {
    pub fn new(cache_size: usize) -> Self {
        Self { cache_size }
    }

    /// Reads [`CACHE_SIZE_ENV`], falling back to the default when it is unset
    /// or unparsable.
    pub fn from_env() -> Self {
        match std::env::var(CACHE_SIZE_ENV) {
            Ok(raw) => match Self::parse_cache_size(&raw) {
                Ok(config) => config,
                Err(err) => {
                    warn!(%err, "ignoring {}, using default {}", CACHE_SIZE_ENV, DEFAULT_SIZE);
                    Self::default()
                },
            },
            Err(_) => Self::default(),
        }
    }

    /// Parses a cache size as written in a property or environment variable.
    ///
    /// Accepts decimal or `0x`-prefixed hexadecimal.
    ///
    /// ```
    /// use blobcache::config::BlobStringsCacheConfig;
    ///
    /// assert_eq!(BlobStringsCacheConfig::parse_cache_size("0x1000").unwrap().cache_size, 4096);
    /// assert_eq!(BlobStringsCacheConfig::parse_cache_size(" 512 ").unwrap().cache_size, 512);
    /// assert!(BlobStringsCacheConfig::parse_cache_size("0").is_err());
    /// ```
    pub fn parse_cache_size(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => usize::from_str_radix(hex, 16),
            None => trimmed.parse::<usize>(),
        };
        let config = parsed.map(Self::new).map_err(|_| ConfigError::Invalid {
            key: CACHE_SIZE_KEY,
            value: raw.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_size == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for BlobStringsCacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}
