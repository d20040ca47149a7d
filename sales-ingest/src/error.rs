//! Error types for migrations, generation and ingestion

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("Migration {name} failed: {source}")]
    Migration {
        name: &'static str,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl IngestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(file: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            file: file.into(),
            source,
        }
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
