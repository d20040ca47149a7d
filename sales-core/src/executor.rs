//! Query execution seam.

use async_trait::async_trait;

use crate::catalog::Statement;
use crate::error::ReportResult;
use crate::value::{QueryParams, Row};

/// Runs a compiled statement against the database.
///
/// The production implementation lives in the API crate and is backed by a
/// connection pool; tests substitute recording fakes.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Bind `params` by placeholder name, run the statement and return every
    /// row in result order.
    async fn execute(&self, statement: &Statement, params: &QueryParams) -> ReportResult<Vec<Row>>;

    /// Cheap round-trip used by readiness checks.
    async fn ping(&self) -> ReportResult<()>;
}
