//! Cache statistics.

/// Point-in-time counters for a [`ResultCache`](super::ResultCache).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to compute, including expired entries.
    pub misses: u64,
    pub insertions: u64,
    /// Entries dropped to make room for new ones.
    pub evictions: u64,
    /// Entries dropped because their TTL had passed.
    pub expirations: u64,
    pub entry_count: u64,
    pub capacity: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
