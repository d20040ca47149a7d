//! Sales API - HTTP Layer for the Sales Reports
//!
//! Serves the Monthly Sales and Top Products reports over REST (Axum). Each
//! report request is validated, looked up in a short-lived result cache and,
//! on a miss, run as a parameterized aggregate query against PostgreSQL.

pub mod cached_db;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod validation;

// Re-export commonly used types
pub use cached_db::CachedReportClient;
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
