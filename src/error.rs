//! Error taxonomy for the trip pipeline.
//!
//! Rows that fail a validity check are not errors; they are counted by the
//! cleaner and dropped. Everything here aborts the run, except
//! [`EtlError::WriteFailure`], which is scoped to a single view.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("schema mismatch on column '{column}': {reason}")]
    SchemaMismatch { column: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write view '{view}': {reason}")]
    WriteFailure { view: String, reason: String },

    #[error("{} view(s) failed to write: {}", .0.len(), .0.join(", "))]
    WriteFailures(Vec<String>),

    #[error("worker task failed: {0}")]
    TaskJoin(String),
}

impl EtlError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        EtlError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub(crate) fn schema(column: impl Into<String>, reason: impl Into<String>) -> Self {
        EtlError::SchemaMismatch {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
