//! Cached Report Client
//!
//! `CachedReportClient` puts the result cache in front of a
//! [`QueryExecutor`]. Handlers call `monthly_sales()` / `top_products()` and
//! never see whether the rows came from the cache or the database.

use std::sync::Arc;

use sales_core::{
    MonthlySalesParams, MonthlySalesResponse, QueryExecutor, QueryParams, ReportKind, ReportResult,
    TopProductsParams, TopProductsResponse,
};
use sales_storage::{CacheRead, CacheSource, CacheStats, ResultCache};

use crate::telemetry::metrics;

/// Report client that checks the result cache before querying.
///
/// # Usage
///
/// ```ignore
/// let client = CachedReportClient::new(Arc::new(db), Arc::new(ResultCache::default()));
/// let body = client.monthly_sales(&params).await?;
/// ```
#[derive(Clone)]
pub struct CachedReportClient {
    executor: Arc<dyn QueryExecutor>,
    cache: Arc<ResultCache>,
}

impl CachedReportClient {
    /// Create a new cached report client.
    pub fn new(executor: Arc<dyn QueryExecutor>, cache: Arc<ResultCache>) -> Self {
        Self { executor, cache }
    }

    /// The underlying executor, for operations that bypass the cache.
    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop all cached results.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Run `report` through the cache.
    pub async fn rows(&self, report: ReportKind, params: &QueryParams) -> ReportResult<CacheRead> {
        let statement = report.statement()?;
        let read = self
            .cache
            .get_or_compute(statement.sql(), params, || self.executor.execute(statement, params))
            .await?;

        let outcome = match read.source() {
            CacheSource::Hit => "hit",
            CacheSource::Miss => "miss",
        };
        tracing::debug!(report = report.as_str(), cache = outcome, rows = read.rows().len(), "Report rows loaded");
        if let Some(metrics) = metrics() {
            metrics.record_cache_lookup(report.as_str(), outcome);
        }

        Ok(read)
    }

    /// Monthly revenue and quantity within the requested range.
    pub async fn monthly_sales(&self, params: &MonthlySalesParams) -> ReportResult<MonthlySalesResponse> {
        let read = self
            .rows(ReportKind::MonthlySales, &params.to_query_params())
            .await?;
        MonthlySalesResponse::from_rows(read.rows())
    }

    /// Top products by revenue within the requested range.
    pub async fn top_products(&self, params: &TopProductsParams) -> ReportResult<TopProductsResponse> {
        let read = self
            .rows(ReportKind::TopProducts, &params.to_query_params())
            .await?;
        TopProductsResponse::from_rows(read.rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sales_core::{DateRange, Row};
    use sales_test_utils::RecordingExecutor;

    fn june() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        )
        .unwrap()
    }

    fn month_row() -> Row {
        Row::new()
            .with("month", "2025-06")
            .with("total_revenue", 300i64)
            .with("total_quantity", 30i64)
    }

    #[tokio::test]
    async fn test_second_call_uses_cache() {
        let executor = Arc::new(RecordingExecutor::with_rows(vec![month_row()]));
        let client = CachedReportClient::new(executor.clone(), Arc::new(ResultCache::default()));
        let params = MonthlySalesParams::new(june(), None, None);

        let first = client.monthly_sales(&params).await.unwrap();
        let second = client.monthly_sales(&params).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.rows[0].total_revenue, 300);
        assert_eq!(executor.calls(), 1);
        assert_eq!(client.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_different_filters_query_separately() {
        let executor = Arc::new(RecordingExecutor::with_rows(vec![month_row()]));
        let client = CachedReportClient::new(executor.clone(), Arc::new(ResultCache::default()));

        client
            .monthly_sales(&MonthlySalesParams::new(june(), None, Some("EU".into())))
            .await
            .unwrap();
        client
            .monthly_sales(&MonthlySalesParams::new(june(), None, Some("US".into())))
            .await
            .unwrap();

        assert_eq!(executor.calls(), 2);
        assert_eq!(client.cache_stats().entry_count, 2);
    }

    #[tokio::test]
    async fn test_executor_failure_is_not_cached() {
        let executor = Arc::new(RecordingExecutor::failing(sales_core::ReportError::PoolExhausted));
        let client = CachedReportClient::new(executor.clone(), Arc::new(ResultCache::default()));
        let params = TopProductsParams::new(june(), None, None).unwrap();

        assert!(client.top_products(&params).await.is_err());
        assert!(client.top_products(&params).await.is_err());
        assert_eq!(executor.calls(), 2);
        assert_eq!(client.cache_stats().entry_count, 0);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_requery() {
        let executor = Arc::new(RecordingExecutor::with_rows(vec![month_row()]));
        let client = CachedReportClient::new(executor.clone(), Arc::new(ResultCache::default()));
        let params = MonthlySalesParams::new(june(), None, None);

        client.monthly_sales(&params).await.unwrap();
        client.clear_cache();
        client.monthly_sales(&params).await.unwrap();
        assert_eq!(executor.calls(), 2);
    }
}
