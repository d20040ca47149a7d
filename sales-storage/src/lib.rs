//! Result cache for the sales reporting service.
//!
//! Aggregate query results are memoized by (statement text, parameters) in
//! a bounded, time-expiring LRU. The cache is an ordinary value created at
//! startup and passed to whoever needs it; there is no global instance.

pub mod cache;

pub use cache::{CacheConfig, CacheKey, CacheRead, CacheSource, CacheStats, ResultCache};
