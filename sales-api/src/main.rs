//! Sales API Server Entry Point
//!
//! Bootstraps telemetry, configuration, the connection pool and the result
//! cache, then starts the Axum HTTP server.

use std::sync::Arc;

use axum::Router;
use sales_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, DbClient, DbConfig};
use sales_storage::ResultCache;

use sales_api::telemetry::{init_tracer, shutdown_tracer, TelemetryConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let addr = api_config.bind_addr()?;

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;
    tracing::info!(max_size = db_config.max_size, "Connection pool created");

    let cache = Arc::new(ResultCache::new(api_config.cache_config()));
    tracing::info!(
        ttl_secs = api_config.cache_ttl.as_secs(),
        max_entries = api_config.cache_max_entries,
        "Result cache created"
    );

    let state = AppState::new(Arc::new(db.clone()), cache.clone());
    let app: Router = create_api_router(state, &api_config);

    tracing::info!(%addr, "Starting Sales API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    cache.clear();
    db.close();
    shutdown_tracer();
    Ok(())
}
