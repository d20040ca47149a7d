//! Property-Based Tests for Report Request Handling
//!
//! - Every in-range `limit` is accepted and every out-of-range one is
//!   rejected with 422 before the database is touched.
//! - The order of query parameters never changes the response or the cache
//!   key: any permutation of the same parameters is served from one query.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{Request, StatusCode},
    Router,
};
use proptest::prelude::*;
use sales_api::{create_api_router, ApiConfig, AppState};
use sales_core::QueryExecutor;
use sales_storage::ResultCache;
use sales_test_utils::generators::{arb_date_range, arb_invalid_limit, arb_limit, arb_region_code};
use sales_test_utils::{fixtures, RecordingExecutor, SeedExecutor};
use tower::ServiceExt;

fn app(executor: Arc<dyn QueryExecutor>) -> Router {
    let state = AppState::new(executor, Arc::new(ResultCache::default()));
    create_api_router(state, &ApiConfig::default())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Bytes) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request");
    let response = app.clone().oneshot(request).await.expect("Router failed");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    (status, body)
}

const JUNE: &str = "start_date=2025-06-01&end_date=2025-07-01";

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_valid_limit_is_accepted(limit in arb_limit()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let executor = Arc::new(RecordingExecutor::empty());
            let app = app(executor.clone());

            let uri = format!("/reports/top-products?{}&limit={}", JUNE, limit);
            let (status, _) = get(&app, &uri).await;

            prop_assert_eq!(status, StatusCode::OK);
            prop_assert_eq!(executor.calls(), 1);
            Ok(())
        })?;
    }

    #[test]
    fn prop_invalid_limit_is_rejected(limit in arb_invalid_limit()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let executor = Arc::new(RecordingExecutor::empty());
            let app = app(executor.clone());

            let uri = format!("/reports/top-products?{}&limit={}", JUNE, limit);
            let (status, body) = get(&app, &uri).await;

            prop_assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            prop_assert!(String::from_utf8_lossy(&body).contains("INVALID_RANGE"));
            prop_assert_eq!(executor.calls(), 0);
            Ok(())
        })?;
    }

    #[test]
    fn prop_parameter_order_shares_cache_entry(
        range in arb_date_range(),
        region in arb_region_code(),
        limit in arb_limit(),
        order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let executor = Arc::new(SeedExecutor::new(fixtures::seed_multi_region()));
            let app = app(executor.clone());

            let pairs = [
                format!("start_date={}", range.start().format("%Y-%m-%d")),
                format!("end_date={}", range.end().format("%Y-%m-%d")),
                format!("region_code={}", region),
                format!("limit={}", limit),
            ];
            let canonical = pairs.join("&");
            let shuffled = order
                .iter()
                .map(|&i| pairs[i].as_str())
                .collect::<Vec<_>>()
                .join("&");

            let (first_status, first) =
                get(&app, &format!("/reports/top-products?{}", canonical)).await;
            let (second_status, second) =
                get(&app, &format!("/reports/top-products?{}", shuffled)).await;

            prop_assert_eq!(first_status, StatusCode::OK);
            prop_assert_eq!(second_status, StatusCode::OK);
            prop_assert_eq!(first, second);
            prop_assert_eq!(executor.calls(), 1);
            Ok(())
        })?;
    }
}
