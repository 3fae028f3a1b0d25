/// Point-in-time view of a [`SoftLongCache`](crate::store::soft::SoftLongCache).
///
/// Counters are cumulative since construction or the last explicit `clear()`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SoftCacheMetricsSnapshot {
    pub attempts: u64,
    pub hits: u64,

    pub inserts: u64,
    pub updates: u64,
    pub evictions: u64,
    pub removes: u64,
    pub reclaimed: u64, // entries dropped by memory-pressure reclaim

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub capacity: usize,
    pub chunks: usize,
}

impl SoftCacheMetricsSnapshot {
    pub fn misses(&self) -> u64 {
        self.attempts - self.hits
    }

    /// Hits / attempts, 0 when nothing was looked up yet.
    pub fn hit_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.hits as f64 / self.attempts as f64
        }
    }
}
