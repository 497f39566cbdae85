//! # Search Error Types Module
//!
//! Error types for semantic article search.

use thiserror::Error;

use crate::error::Error as CrateError;
use crate::index::DbError;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    /// Error occurred during database operations
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Error occurred during query embedding
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Error occurred in the vector index
    #[error("Index error: {0}")]
    Index(String),

    /// Invalid search parameters
    #[error("Invalid search parameters: {0}")]
    InvalidParameters(String),
}

impl From<SearchError> for CrateError {
    fn from(err: SearchError) -> Self {
        CrateError::Search(err.to_string())
    }
}
