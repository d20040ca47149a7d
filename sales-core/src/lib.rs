//! Sales Core - Report Types and Query Catalog
//!
//! Data types shared by every crate in the workspace: scalar values and
//! result rows, the two report statements, the typed report rows returned
//! over HTTP, and the `QueryExecutor` seam the API and tests plug into.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod reports;
pub mod value;

pub use catalog::{Statement, StatementError, MONTHLY_SALES, TOP_PRODUCTS};
pub use error::{ReportError, ReportResult};
pub use executor::QueryExecutor;
pub use reports::{
    DateRange, FromRow, MonthRow, MonthlySalesParams, MonthlySalesResponse, ReportKind,
    TopProductRow, TopProductsParams, TopProductsResponse, DEFAULT_TOP_LIMIT, MAX_TOP_LIMIT,
    MIN_TOP_LIMIT,
};
pub use value::{QueryParams, Row, SqlValue};
