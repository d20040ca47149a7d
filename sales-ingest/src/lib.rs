//! Sales Ingest
//!
//! Schema migrations for the sales reporting database, a synthetic CSV
//! dataset generator, and the CSV loader that fills the database from it.

pub mod error;
pub mod generator;
pub mod loader;
pub mod migrations;
pub mod records;

pub use error::{IngestError, IngestResult};
pub use generator::{generate_dataset, GeneratedCounts, GeneratorConfig};
pub use loader::{ingest_dir, read_csv, validate_sales, IngestSummary, ValidatedSales};
pub use migrations::{run_migrations, Migration, MIGRATIONS};
pub use records::{ProductRecord, RawSaleRecord, RegionRecord, RejectReason, SaleRecord};
