//! Error types for the herald crate

use thiserror::Error;

/// Result type for herald operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for herald operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Feed or article fetch error
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Classification, summarization or embedding error
    #[error("Process error: {0}")]
    Process(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Vector index error
    #[error("Index error: {0}")]
    Index(String),

    /// Search error
    #[error("Search error: {0}")]
    Search(String),

    /// Ingestion run error
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
