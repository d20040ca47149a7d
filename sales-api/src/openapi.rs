//! OpenAPI Specification for the Sales Reports API
//!
//! Generated with utoipa from the handler annotations and response types.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::{health, reports};
use crate::telemetry::metrics;

use sales_core::{MonthRow, MonthlySalesResponse, TopProductRow, TopProductsResponse};

/// OpenAPI document for the Sales Reports API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sales Reports API",
        version = "0.3.0",
        description = "Cached aggregate reports over products, regions and month-partitioned sales",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local Development")
    ),
    tags(
        (name = "Reports", description = "Monthly sales and top products reports"),
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        reports::monthly_sales,
        reports::top_products,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Report Types ===
            MonthRow, TopProductRow, MonthlySalesResponse, TopProductsResponse,

            // === Health Types ===
            health::LivenessResponse, health::ReadinessResponse, health::HealthStatus,
            health::ComponentHealth, health::CacheHealth,
        )
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }

    /// Generate OpenAPI spec as YAML string.
    #[cfg(feature = "openapi")]
    pub fn to_yaml() -> Result<String, String> {
        let openapi = Self::openapi();
        serde_yaml::to_string(&openapi).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Sales Reports API");

        let paths = &openapi.paths.paths;
        for path in ["/reports/monthly-sales", "/reports/top-products", "/health", "/health/ready", "/metrics"] {
            assert!(paths.contains_key(path), "missing path {}", path);
        }

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.schemas.contains_key("MonthRow"));
        assert!(components.schemas.contains_key("ApiError"));
        Ok(())
    }

    #[test]
    fn test_top_products_documents_query_params() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| e.to_string())?;
        let value: serde_json::Value = serde_json::from_str(&json).map_err(|e| e.to_string())?;
        let params = value["paths"]["/reports/top-products"]["get"]["parameters"]
            .as_array()
            .ok_or("parameters missing")?;
        let names: Vec<&str> = params.iter().filter_map(|p| p["name"].as_str()).collect();
        assert_eq!(names, vec!["start_date", "end_date", "region_code", "limit"]);
        Ok(())
    }

    #[cfg(feature = "openapi")]
    #[test]
    fn test_openapi_yaml_serialization() -> Result<(), String> {
        let yaml = ApiDoc::to_yaml()?;
        assert!(yaml.contains("Sales Reports API"));
        Ok(())
    }
}
