//! Error types for the ingest module

use crate::error::Error as CrateError;
use crate::index::{DbError, IndexError};
use crate::processor::ProcessError;
use thiserror::Error;

/// Error type for ingestion runs
#[derive(Debug, Error)]
pub enum IngestError {
    /// Another run holds the pipeline; nothing was touched
    #[error("An ingestion run is already in progress")]
    AlreadyRunning,

    /// The pipeline could not be assembled
    #[error("Pipeline setup error: {0}")]
    Setup(String),

    /// Embedding error outside the per-article stages
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Persistence failure; the batch was rolled back
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Vector index failure; indexing was halted
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

impl From<IngestError> for CrateError {
    fn from(err: IngestError) -> Self {
        CrateError::Ingest(err.to_string())
    }
}
