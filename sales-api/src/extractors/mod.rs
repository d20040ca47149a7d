//! Custom request extractors.

pub mod query;

pub use query::ReportQuery;
