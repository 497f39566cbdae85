//! # Index Error Types Module
//!
//! Error types for the persistence store and the in-memory vector index.
//!
//! ## Key Components
//!
//! - `DbError`: failures of libsql operations against the article store
//! - `IndexError`: failures of the vector index, including the fatal
//!   consistency violation between vectors and their metadata

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for database operations
#[derive(Debug, Error)]
pub enum DbError {
    /// LibSQL error
    #[error("LibSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// SQL query error
    #[error("SQL query error: {0}")]
    Query(String),

    /// Schema error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Data error
    #[error("Data error: {0}")]
    Data(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transaction error; the transaction was rolled back
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl From<DbError> for CrateError {
    fn from(err: DbError) -> Self {
        CrateError::Database(err.to_string())
    }
}

/// Error type for vector index operations
#[derive(Debug, Error)]
pub enum IndexError {
    /// Vector does not have the index dimension
    #[error("Vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch {
        /// Index dimension
        expected: usize,
        /// Offered vector dimension
        actual: usize,
    },

    /// Vector is zero or contains non-finite values
    #[error("Vector cannot be normalized")]
    InvalidVector,

    /// A position at or below the last recorded one; positions only grow
    #[error("Position {position} is not after the last indexed position {last}")]
    OutOfOrder {
        /// Offered position
        position: u64,
        /// Highest recorded position
        last: u64,
    },

    /// Vector count and metadata size disagree. Indexing must stop.
    #[error("Index inconsistent: {vectors} vectors but {entries} metadata entries")]
    Inconsistent {
        /// Vectors in the store
        vectors: usize,
        /// Entries in the position map
        entries: usize,
    },
}

impl From<IndexError> for CrateError {
    fn from(err: IndexError) -> Self {
        CrateError::Index(err.to_string())
    }
}
