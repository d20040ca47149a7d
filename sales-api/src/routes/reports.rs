//! Report REST API Routes
//!
//! Both handlers follow the same pipeline: validate the query string, build
//! the report parameters, run them through the cached report client and wrap
//! the typed rows in `{"rows": [...]}`. Validation failures never reach the
//! database.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use sales_core::{
    MonthlySalesParams, MonthlySalesResponse, TopProductsParams, TopProductsResponse,
    DEFAULT_TOP_LIMIT, MAX_TOP_LIMIT, MIN_TOP_LIMIT,
};
use serde::{Deserialize, Serialize};

use crate::cached_db::CachedReportClient;
use crate::error::{ApiError, ApiResult};
use crate::extractors::ReportQuery;
use crate::state::AppState;
use crate::validation::{date_range, parse_optional_i64, ValidateRange};

// ============================================================================
// REQUEST TYPES
// ============================================================================

/// Query parameters for the Monthly Sales report.
///
/// Every field is optional at the extractor level so that a missing required
/// field is reported as `MISSING_FIELD` rather than a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct MonthlySalesQuery {
    /// Inclusive start date (YYYY-MM-DD). Required.
    pub start_date: Option<String>,
    /// Exclusive end date (YYYY-MM-DD). Required.
    pub end_date: Option<String>,
    /// Only count sales of exactly this product SKU.
    pub product_sku: Option<String>,
    /// Only count sales in this region code.
    pub region_code: Option<String>,
}

impl MonthlySalesQuery {
    pub fn validate(self) -> ApiResult<MonthlySalesParams> {
        let range = date_range(self.start_date.as_deref(), self.end_date.as_deref())?;
        Ok(MonthlySalesParams::new(range, self.product_sku, self.region_code))
    }
}

/// Query parameters for the Top Products report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct TopProductsQuery {
    /// Inclusive start date (YYYY-MM-DD). Required.
    pub start_date: Option<String>,
    /// Exclusive end date (YYYY-MM-DD). Required.
    pub end_date: Option<String>,
    /// Only count sales in this region code.
    pub region_code: Option<String>,
    /// Number of products to return, 1 to 50 (default 5).
    #[cfg_attr(feature = "openapi", param(value_type = Option<i64>, minimum = 1, maximum = 50))]
    pub limit: Option<String>,
}

impl TopProductsQuery {
    pub fn validate(self) -> ApiResult<TopProductsParams> {
        let range = date_range(self.start_date.as_deref(), self.end_date.as_deref())?;

        let limit = parse_optional_i64("limit", self.limit.as_deref())?.unwrap_or(DEFAULT_TOP_LIMIT);
        limit.validate_range("limit", MIN_TOP_LIMIT, MAX_TOP_LIMIT)?;

        Ok(TopProductsParams::new(range, self.region_code, Some(limit))?)
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /reports/monthly-sales - Revenue and quantity per month
#[utoipa::path(
    get,
    path = "/reports/monthly-sales",
    tag = "Reports",
    params(MonthlySalesQuery),
    responses(
        (status = 200, description = "Monthly totals in ascending month order", body = MonthlySalesResponse),
        (status = 422, description = "Missing or invalid parameter", body = ApiError),
        (status = 500, description = "Query failed", body = ApiError),
        (status = 503, description = "Database unavailable or pool exhausted", body = ApiError),
    ),
)]
pub async fn monthly_sales(
    State(reports): State<CachedReportClient>,
    ReportQuery(query): ReportQuery<MonthlySalesQuery>,
) -> ApiResult<impl IntoResponse> {
    let params = query.validate()?;
    let body: MonthlySalesResponse = reports.monthly_sales(&params).await?;

    Ok(Json(body))
}

/// GET /reports/top-products - Products ranked by revenue
#[utoipa::path(
    get,
    path = "/reports/top-products",
    tag = "Reports",
    params(TopProductsQuery),
    responses(
        (status = 200, description = "At most `limit` products by descending revenue", body = TopProductsResponse),
        (status = 422, description = "Missing or invalid parameter", body = ApiError),
        (status = 500, description = "Query failed", body = ApiError),
        (status = 503, description = "Database unavailable or pool exhausted", body = ApiError),
    ),
)]
pub async fn top_products(
    State(reports): State<CachedReportClient>,
    ReportQuery(query): ReportQuery<TopProductsQuery>,
) -> ApiResult<impl IntoResponse> {
    let params = query.validate()?;
    let body: TopProductsResponse = reports.top_products(&params).await?;

    Ok(Json(body))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the report routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/monthly-sales", get(monthly_sales))
        .route("/top-products", get(top_products))
}
