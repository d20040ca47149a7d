//! Shared application state for Axum routers.

use std::sync::Arc;

use sales_core::QueryExecutor;
use sales_storage::ResultCache;

use crate::cached_db::CachedReportClient;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Report client with the result cache in front of the executor.
    ///
    /// Readiness checks reach the executor through `reports.executor()`.
    pub reports: CachedReportClient,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(executor: Arc<dyn QueryExecutor>, cache: Arc<ResultCache>) -> Self {
        Self {
            reports: CachedReportClient::new(executor, cache),
            start_time: std::time::Instant::now(),
        }
    }
}

crate::impl_from_ref!(CachedReportClient, reports);
crate::impl_from_ref!(std::time::Instant, start_time);
