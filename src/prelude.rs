pub use crate::blob_strings::{CacheEntry, CacheKey, StringBlobCache};
pub use crate::builder::SoftCacheBuilder;
pub use crate::config::BlobStringsCacheConfig;
pub use crate::error::ConfigError;
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::SoftCacheMetricsSnapshot;
pub use crate::store::soft::SoftLongCache;
pub use crate::traits::{BlobContainer, MemoryPressure, SoftCache};
