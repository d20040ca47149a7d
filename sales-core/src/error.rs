//! Error types for report operations

use thiserror::Error;

use crate::catalog::StatementError;

/// Errors produced below the HTTP boundary.
///
/// The API layer maps each variant onto a status code; nothing here knows
/// about HTTP.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("Invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Query failed: {reason}")]
    Query { reason: String },

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Database unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Unexpected value in column {column}: {reason}")]
    RowShape { column: String, reason: String },
}

impl ReportError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn query(reason: impl Into<String>) -> Self {
        Self::Query {
            reason: reason.into(),
        }
    }

    pub fn row_shape(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RowShape {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller supplied bad input (as opposed to a server fault).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<StatementError> for ReportError {
    fn from(err: StatementError) -> Self {
        Self::query(err.to_string())
    }
}

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;
