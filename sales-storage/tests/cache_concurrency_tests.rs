//! Concurrent access to a shared result cache.
//!
//! Many tasks on a multi-threaded runtime call `get_or_compute` on one
//! `Arc<ResultCache>`. Every caller must get the rows for its own key, the
//! capacity bound must hold, and concurrent misses on one key must leave a
//! single entry behind.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sales_core::{QueryParams, Row, SqlValue};
use sales_storage::{CacheConfig, ResultCache};
use tokio::sync::Barrier;

fn params(region: &str) -> QueryParams {
    QueryParams::from([
        ("start".to_string(), SqlValue::from("2025-06-01")),
        ("region".to_string(), SqlValue::from(region)),
    ])
}

fn rows_for(region: &str) -> Vec<Row> {
    vec![Row::new().with("region", region)]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_keys_return_their_own_rows() {
    const MAX_ENTRIES: usize = 4;
    let cache = Arc::new(ResultCache::new(
        CacheConfig::new().with_max_entries(MAX_ENTRIES),
    ));
    let regions: Vec<String> = (0..10).map(|i| format!("R{}", i)).collect();

    let mut handles = Vec::new();
    for i in 0..200 {
        let cache = Arc::clone(&cache);
        let region = regions[i % regions.len()].clone();
        handles.push(tokio::spawn(async move {
            let read = cache
                .get_or_compute("q", &params(&region), || async {
                    tokio::task::yield_now().await;
                    Ok::<_, String>(rows_for(&region))
                })
                .await
                .expect("compute never fails");
            assert_eq!(read.rows(), rows_for(&region).as_slice());
            assert!(cache.len() <= MAX_ENTRIES);
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked");
    }

    assert!(cache.len() <= MAX_ENTRIES);
    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_key_stampede_leaves_one_entry() {
    const TASKS: usize = 16;
    let cache = Arc::new(ResultCache::default());
    let computed = Arc::new(AtomicUsize::new(0));
    // Every task is held inside compute until all of them have missed.
    let barrier = Arc::new(Barrier::new(TASKS));

    let mut handles = Vec::new();
    for _ in 0..TASKS {
        let cache = Arc::clone(&cache);
        let computed = Arc::clone(&computed);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            cache
                .get_or_compute("q", &params("EU"), || async move {
                    computed.fetch_add(1, Ordering::SeqCst);
                    barrier.wait().await;
                    Ok::<_, String>(rows_for("EU"))
                })
                .await
                .expect("compute never fails")
        }));
    }
    for handle in handles {
        let read = handle.await.expect("task panicked");
        assert_eq!(read.rows(), rows_for("EU").as_slice());
    }

    assert_eq!(computed.load(Ordering::SeqCst), TASKS);
    assert_eq!(cache.len(), 1);
    let stats = cache.stats();
    assert_eq!(stats.insertions, TASKS as u64);
    assert_eq!(stats.evictions, 0);

    let read = cache
        .get_or_compute("q", &params("EU"), || async { Err::<Vec<Row>, _>("not called") })
        .await
        .expect("served from cache");
    assert!(read.was_cache_hit());
}
