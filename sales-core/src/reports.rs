//! Report parameters and rows
//!
//! Validated inputs for the two reports and the typed rows they produce.
//! Rows are decoded by column name from the generic [`Row`] the executor
//! returns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{self, Statement};
use crate::error::{ReportError, ReportResult};
use crate::value::{QueryParams, Row, SqlValue};

/// Number of products returned when the caller does not ask for a limit.
pub const DEFAULT_TOP_LIMIT: i64 = 5;
pub const MIN_TOP_LIMIT: i64 = 1;
pub const MAX_TOP_LIMIT: i64 = 50;

/// The reports the service knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    MonthlySales,
    TopProducts,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MonthlySales => "monthly_sales",
            Self::TopProducts => "top_products",
        }
    }

    pub fn statement(&self) -> ReportResult<&'static Statement> {
        match self {
            Self::MonthlySales => catalog::monthly_sales(),
            Self::TopProducts => catalog::top_products(),
        }
    }
}

/// Half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Inverted ranges are rejected. `start == end` is a valid, empty range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> ReportResult<Self> {
        if start > end {
            return Err(ReportError::validation(
                "end_date",
                format!("end_date ({}) must not be before start_date ({})", end, start),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Inputs for the Monthly Sales report. Empty filters mean "no filter".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySalesParams {
    pub range: DateRange,
    pub product_sku: String,
    pub region_code: String,
}

impl MonthlySalesParams {
    pub fn new(range: DateRange, product_sku: Option<String>, region_code: Option<String>) -> Self {
        Self {
            range,
            product_sku: product_sku.unwrap_or_default(),
            region_code: region_code.unwrap_or_default(),
        }
    }

    pub fn to_query_params(&self) -> QueryParams {
        QueryParams::from([
            ("start".to_string(), SqlValue::Date(self.range.start)),
            ("end".to_string(), SqlValue::Date(self.range.end)),
            ("sku".to_string(), SqlValue::Text(self.product_sku.clone())),
            ("region".to_string(), SqlValue::Text(self.region_code.clone())),
        ])
    }
}

/// Inputs for the Top Products report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopProductsParams {
    pub range: DateRange,
    pub region_code: String,
    pub limit: i64,
}

impl TopProductsParams {
    /// A limit outside `[MIN_TOP_LIMIT, MAX_TOP_LIMIT]` is rejected, not clamped.
    pub fn new(range: DateRange, region_code: Option<String>, limit: Option<i64>) -> ReportResult<Self> {
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT);
        if !(MIN_TOP_LIMIT..=MAX_TOP_LIMIT).contains(&limit) {
            return Err(ReportError::validation(
                "limit",
                format!("must be between {} and {}", MIN_TOP_LIMIT, MAX_TOP_LIMIT),
            ));
        }
        Ok(Self {
            range,
            region_code: region_code.unwrap_or_default(),
            limit,
        })
    }

    pub fn to_query_params(&self) -> QueryParams {
        QueryParams::from([
            ("start".to_string(), SqlValue::Date(self.range.start)),
            ("end".to_string(), SqlValue::Date(self.range.end)),
            ("region".to_string(), SqlValue::Text(self.region_code.clone())),
            ("limit".to_string(), SqlValue::Int(self.limit)),
        ])
    }
}

/// Decode a typed row from a generic result row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> ReportResult<Self>;
}

/// Revenue and quantity for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MonthRow {
    /// Month formatted as `YYYY-MM`.
    #[cfg_attr(feature = "openapi", schema(example = "2025-06"))]
    pub month: String,
    pub total_revenue: i64,
    pub total_quantity: i64,
}

impl FromRow for MonthRow {
    fn from_row(row: &Row) -> ReportResult<Self> {
        Ok(Self {
            month: row.text("month")?.to_string(),
            total_revenue: row.int("total_revenue")?,
            total_quantity: row.int("total_quantity")?,
        })
    }
}

/// Revenue and quantity for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TopProductRow {
    pub product_sku: String,
    pub product_name: String,
    pub total_revenue: i64,
    pub total_quantity: i64,
}

impl FromRow for TopProductRow {
    fn from_row(row: &Row) -> ReportResult<Self> {
        Ok(Self {
            product_sku: row.text("product_sku")?.to_string(),
            product_name: row.text("product_name")?.to_string(),
            total_revenue: row.int("total_revenue")?,
            total_quantity: row.int("total_quantity")?,
        })
    }
}

fn decode_all<T: FromRow>(rows: &[Row]) -> ReportResult<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}

/// Monthly Sales response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MonthlySalesResponse {
    pub rows: Vec<MonthRow>,
}

impl MonthlySalesResponse {
    pub fn from_rows(rows: &[Row]) -> ReportResult<Self> {
        Ok(Self {
            rows: decode_all(rows)?,
        })
    }
}

/// Top Products response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TopProductsResponse {
    pub rows: Vec<TopProductRow>,
}

impl TopProductsResponse {
    pub fn from_rows(rows: &[Row]) -> ReportResult<Self> {
        Ok(Self {
            rows: decode_all(rows)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn june() -> DateRange {
        DateRange::new(date(2025, 6, 1), date(2025, 7, 1)).unwrap()
    }

    #[test]
    fn test_date_range_allows_empty_rejects_inverted() {
        assert!(DateRange::new(date(2025, 6, 1), date(2025, 6, 1)).is_ok());
        let err = DateRange::new(date(2025, 7, 1), date(2025, 6, 1)).unwrap_err();
        assert!(matches!(err, ReportError::Validation { ref field, .. } if field == "end_date"));
    }

    #[test]
    fn test_monthly_params_default_filters_to_empty() {
        let params = MonthlySalesParams::new(june(), None, Some("EU".to_string()));
        let query = params.to_query_params();
        assert_eq!(query.get("sku"), Some(&SqlValue::Text(String::new())));
        assert_eq!(query.get("region"), Some(&SqlValue::Text("EU".to_string())));
        assert_eq!(query.get("start"), Some(&SqlValue::Date(date(2025, 6, 1))));
        assert_eq!(query.len(), 4);
    }

    #[test]
    fn test_top_limit_bounds() {
        assert_eq!(TopProductsParams::new(june(), None, None).unwrap().limit, DEFAULT_TOP_LIMIT);
        assert!(TopProductsParams::new(june(), None, Some(1)).is_ok());
        assert!(TopProductsParams::new(june(), None, Some(50)).is_ok());
        assert!(TopProductsParams::new(june(), None, Some(0)).is_err());
        assert!(TopProductsParams::new(june(), None, Some(51)).is_err());
        assert!(TopProductsParams::new(june(), None, Some(-3)).is_err());
    }

    #[test]
    fn test_query_params_match_statement_placeholders() {
        let monthly = MonthlySalesParams::new(june(), None, None).to_query_params();
        assert!(ReportKind::MonthlySales.statement().unwrap().bind(&monthly).is_ok());

        let top = TopProductsParams::new(june(), None, Some(3)).unwrap().to_query_params();
        assert!(ReportKind::TopProducts.statement().unwrap().bind(&top).is_ok());
    }

    #[test]
    fn test_month_row_from_row() {
        let row = Row::new()
            .with("month", "2025-06")
            .with("total_revenue", 300i64)
            .with("total_quantity", 30i64);
        let decoded = MonthRow::from_row(&row).unwrap();
        assert_eq!(
            decoded,
            MonthRow {
                month: "2025-06".to_string(),
                total_revenue: 300,
                total_quantity: 30,
            }
        );
    }

    #[test]
    fn test_null_sum_is_row_shape_error() {
        let row = Row::new()
            .with("product_sku", "A")
            .with("product_name", "Product A")
            .with("total_revenue", SqlValue::Null)
            .with("total_quantity", 2i64);
        let err = TopProductRow::from_row(&row).unwrap_err();
        assert!(matches!(err, ReportError::RowShape { ref column, .. } if column == "total_revenue"));
    }

    #[test]
    fn test_response_envelope_shape() {
        let rows = vec![Row::new()
            .with("month", "2025-06")
            .with("total_revenue", 300i64)
            .with("total_quantity", 30i64)];
        let body = MonthlySalesResponse::from_rows(&rows).unwrap();
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"rows":[{"month":"2025-06","total_revenue":300,"total_quantity":30}]}"#
        );
    }
}
