//! Read-through result cache.

use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use sales_core::{QueryParams, Row};
use tokio::time::Instant;

use super::key::CacheKey;
use super::stats::CacheStats;

/// Configuration for the result cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached results. Zero is treated as one.
    pub max_entries: usize,
    /// Time an entry stays valid after insertion.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 128,
            ttl: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of entries.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Where the rows in a [`CacheRead`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Hit,
    Miss,
}

/// Rows returned by [`ResultCache::get_or_compute`].
#[derive(Debug, Clone)]
pub struct CacheRead {
    rows: Arc<Vec<Row>>,
    source: CacheSource,
}

impl CacheRead {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn source(&self) -> CacheSource {
        self.source
    }

    pub fn was_cache_hit(&self) -> bool {
        self.source == CacheSource::Hit
    }

    pub fn into_rows(self) -> Arc<Vec<Row>> {
        self.rows
    }
}

#[derive(Debug)]
struct CacheEntry {
    rows: Arc<Vec<Row>>,
    inserted_at: Instant,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

/// Bounded LRU cache of query results with a fixed TTL.
pub struct ResultCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
    counters: Counters,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl,
            counters: Counters::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Lock the entries, recovering from a poisoned lock.
    ///
    /// A panic while the lock was held may have left the LRU half-updated, so
    /// recovery drops every entry before handing the guard out.
    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            tracing::warn!("Result cache lock poisoned, clearing cached entries");
            let mut entries = poisoned.into_inner();
            entries.clear();
            self.entries.clear_poison();
            entries
        })
    }

    /// Look up a live entry, refreshing its recency.
    ///
    /// Expired entries are removed and reported as absent.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<Row>>> {
        let mut entries = self.lock();

        let expired = match entries.peek(key) {
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
        };

        if expired {
            entries.pop(key);
            self.counters.expirations.fetch_add(1, Ordering::Relaxed);
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        entries.get(key).map(|entry| Arc::clone(&entry.rows))
    }

    /// Store rows under `key`, replacing any previous entry.
    pub fn insert(&self, key: CacheKey, rows: Arc<Vec<Row>>) {
        let mut entries = self.lock();
        let replacing = entries.contains(&key);
        let displaced = entries.push(
            key,
            CacheEntry {
                rows,
                inserted_at: Instant::now(),
            },
        );
        if displaced.is_some() && !replacing {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.counters.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Return cached rows for `(sql, params)` or run `compute` and cache
    /// its result.
    ///
    /// Errors from `compute` are returned unchanged and nothing is cached.
    /// The lock is released while `compute` runs.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        sql: &str,
        params: &QueryParams,
        compute: F,
    ) -> Result<CacheRead, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Row>, E>>,
    {
        let key = CacheKey::new(sql, params);

        if let Some(rows) = self.get(&key) {
            return Ok(CacheRead {
                rows,
                source: CacheSource::Hit,
            });
        }

        let rows = Arc::new(compute().await?);
        self.insert(key, Arc::clone(&rows));

        Ok(CacheRead {
            rows,
            source: CacheSource::Miss,
        })
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, including ones that have expired but not
    /// yet been looked up.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let (entry_count, capacity) = {
            let entries = self.lock();
            (entries.len() as u64, entries.cap().get() as u64)
        };
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            insertions: self.counters.insertions.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
            entry_count,
            capacity,
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish()
    }
}
