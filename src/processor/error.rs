//! Error types for the processor module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for processor operations
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The embedding model failed
    #[error("Embedding generation error: {0}")]
    EmbeddingGeneration(#[from] rig::embeddings::EmbeddingError),

    /// The embedding model returned something unusable
    #[error("Embedding processing error: {0}")]
    EmbeddingProcessing(String),

    /// The model produces vectors of a different size than the index expects
    #[error("Embedding dimension mismatch: model produces {actual}, index expects {expected}")]
    DimensionMismatch {
        /// Configured index dimension
        expected: usize,
        /// Model dimension
        actual: usize,
    },

    /// Classification model could not be loaded
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<ProcessError> for CrateError {
    fn from(err: ProcessError) -> Self {
        CrateError::Process(err.to_string())
    }
}

/// Failure inside a classification strategy. Never escapes a `Classifier`.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Nothing left to classify after tokenization
    #[error("no tokens to classify")]
    EmptyInput,

    /// Model tensors do not line up
    #[error("model shape error: {0}")]
    Shape(String),

    /// The model produced a non-finite logit
    #[error("non-finite logit for {0}")]
    NonFinite(String),
}

/// Failure inside a summarization strategy. Never escapes a `Summarizer`.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// The text has no sentence structure to rank
    #[error("no sentences found")]
    NoSentences,

    /// Ranking did not produce usable scores
    #[error("ranking failed: {0}")]
    Ranking(String),
}
