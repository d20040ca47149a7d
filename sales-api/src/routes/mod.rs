//! REST API Route Handlers
//!
//! This module assembles the Axum router for the reporting service:
//! report endpoints, health checks, metrics and the OpenAPI document.

pub mod health;
pub mod reports;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub use health::create_router as health_router;
pub use reports::create_router as reports_router;

// ============================================================================
// OPENAPI ENDPOINTS
// ============================================================================

/// Serve OpenAPI spec as JSON.
#[cfg(not(feature = "swagger-ui"))]
async fn openapi_json() -> impl IntoResponse {
    axum::Json(ApiDoc::openapi())
}

/// Serve OpenAPI spec as YAML.
#[cfg(feature = "openapi")]
async fn openapi_yaml() -> impl IntoResponse {
    use axum::http::StatusCode;

    match ApiDoc::to_yaml() {
        Ok(yaml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/yaml")],
            yaml,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Failed to generate YAML: {}", e),
        ),
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("No route matches the request")
}

// ============================================================================
// ROUTER BUILDER
// ============================================================================

/// Build the CORS layer from configuration.
///
/// An empty origin list allows any origin (development). Only GET is ever
/// served, so only GET and preflight are allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Create the complete API router.
///
/// Routes:
/// - `/health`, `/health/ready`
/// - `/reports/monthly-sales`, `/reports/top-products`
/// - `/metrics`, `/openapi.json`, `/openapi.yaml`, `/swagger-ui`
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> Router {
    use crate::telemetry::{metrics_handler, observability_middleware};
    use axum::middleware::from_fn;

    let mut router = Router::new()
        .nest("/health", health::create_router())
        .nest("/reports", reports::create_router())
        .route("/metrics", get(metrics_handler))
        .fallback(not_found)
        .with_state(state);

    // Swagger UI serves the JSON document itself.
    #[cfg(not(feature = "swagger-ui"))]
    {
        router = router.route("/openapi.json", get(openapi_json));
    }

    #[cfg(feature = "openapi")]
    {
        router = router.route("/openapi.yaml", get(openapi_yaml));
    }

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()));
    }

    let cors = build_cors_layer(api_config);

    router.layer(from_fn(observability_middleware)).layer(cors)
}
