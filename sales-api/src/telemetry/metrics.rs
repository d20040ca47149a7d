//! Prometheus Metrics Definitions
//!
//! Defines the service metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Report query latency buckets (seconds). Aggregates over large ranges can
/// take a while, hence the longer tail.
const QUERY_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<SalesMetrics>> = Lazy::new(SalesMetrics::new);

/// Access the global metrics, logging once-per-call if registration failed.
pub fn metrics() -> Option<&'static SalesMetrics> {
    match METRICS.as_ref() {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            tracing::debug!(error = %e, "Metrics unavailable");
            None
        }
    }
}

/// Container for all service metrics.
#[derive(Clone)]
pub struct SalesMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Report query counter - labels: report, status
    pub report_queries_total: CounterVec,

    /// Report query duration histogram - labels: report
    pub report_query_duration_seconds: HistogramVec,

    /// Result cache lookups - labels: report, outcome (hit/miss/bypass)
    pub report_cache_lookups_total: CounterVec,

    /// Connections currently held by the pool
    pub db_pool_connections: Gauge,
}

impl SalesMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "sales_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_requests_total: {}", e)))?,

            http_request_duration_seconds: register_histogram_vec!(
                "sales_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_request_duration_seconds: {}", e)))?,

            report_queries_total: register_counter_vec!(
                "sales_report_queries_total",
                "Total number of report queries sent to the database",
                &["report", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register report_queries_total: {}", e)))?,

            report_query_duration_seconds: register_histogram_vec!(
                "sales_report_query_duration_seconds",
                "Report query duration in seconds",
                &["report"],
                QUERY_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register report_query_duration_seconds: {}", e)))?,

            report_cache_lookups_total: register_counter_vec!(
                "sales_report_cache_lookups_total",
                "Result cache lookups by outcome",
                &["report", "outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register report_cache_lookups_total: {}", e)))?,

            db_pool_connections: register_gauge!(
                "sales_db_pool_connections",
                "Connections currently held by the database pool"
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register db_pool_connections: {}", e)))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a report query.
    pub fn record_report_query(&self, report: &str, success: bool, duration_secs: f64) {
        let status = if success { "success" } else { "error" };
        self.report_queries_total
            .with_label_values(&[report, status])
            .inc();
        self.report_query_duration_seconds
            .with_label_values(&[report])
            .observe(duration_secs);
    }

    /// Record a result cache lookup.
    pub fn record_cache_lookup(&self, report: &str, outcome: &str) {
        self.report_cache_lookups_total
            .with_label_values(&[report, outcome])
            .inc();
    }

    pub fn set_pool_connections(&self, count: usize) {
        self.db_pool_connections.set(count as f64);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // Make sure the service metrics are registered even before first use.
    let _ = metrics();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
