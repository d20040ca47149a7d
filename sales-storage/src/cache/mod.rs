//! Bounded LRU + TTL cache for query results.
//!
//! # Semantics
//!
//! - Keys are the statement text plus the parameters sorted by name, so the
//!   order parameters were supplied in never matters.
//! - Entries expire a fixed TTL after insertion; an expired entry is treated
//!   as absent and removed when looked up.
//! - When full, inserting evicts the least recently used entry. Hits refresh
//!   recency.
//! - Concurrent misses on the same key may each compute; the last write wins.
//! - Cache failures never fail a request. A poisoned lock is logged, the
//!   entries are dropped and caching carries on.
//!
//! # Example
//!
//! ```ignore
//! let cache = ResultCache::new(CacheConfig::new().with_ttl(Duration::from_secs(60)));
//! let read = cache
//!     .get_or_compute(statement.sql(), &params, || executor.execute(statement, &params))
//!     .await?;
//! if read.was_cache_hit() { /* no query was run */ }
//! ```

pub mod key;
pub mod result_cache;
pub mod stats;

pub use key::CacheKey;
pub use result_cache::{CacheConfig, CacheRead, CacheSource, ResultCache};
pub use stats::CacheStats;
