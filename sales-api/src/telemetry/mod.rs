//! Sales API Telemetry - Observability Infrastructure
//!
//! Provides structured logging, optional OpenTelemetry span export and
//! Prometheus metrics for the API layer. Everything works standalone when no
//! collector is configured.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics, metrics_handler, SalesMetrics, METRICS};
pub use middleware::observability_middleware;
pub use tracer::{init_tracer, shutdown_tracer, TelemetryConfig};
