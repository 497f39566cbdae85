//! # Embedding Model Module
//!
//! Embedding models that back the vector index, all speaking `rig`'s
//! `EmbeddingModel` trait so the rest of the crate is provider-agnostic.
//!
//! ## Key Components
//!
//! - `FastEmbedModel`: local all-MiniLM-L6-v2 sentence embeddings (the default)
//! - `HashingEmbeddingModel`: deterministic feature-hashing stub for tests and
//!   fully offline runs
//! - `RateLimitedEmbeddingModel`: wraps any embedding model with a request quota
//! - `gemini_embedding_model`: Gemini `text-embedding-004`, rate limited
//! - `EmbeddingConversion`, `vec_to_blob`: `rig` embeddings to `f32` vectors
//!   and `F32_BLOB` bytes

use rig::providers::gemini;

pub mod embedding;
pub mod hashing;
pub mod local;
pub mod ratelimited_embedding;

pub use embedding::{EmbeddingConversion, vec_to_blob};
pub use hashing::HashingEmbeddingModel;
pub use local::{FastEmbedModel, MINILM_DIMENSIONS};
pub use ratelimited_embedding::RateLimitedEmbeddingModel;

use crate::processor::ProcessError;

/// Gemini embedding model behind a rate limiter
pub type GeminiEmbeddingModel = RateLimitedEmbeddingModel<gemini::embedding::EmbeddingModel>;

/// Build the Gemini embedding model from `GEMINI_API_KEY`
pub fn gemini_embedding_model(requests_per_minute: u32) -> Result<GeminiEmbeddingModel, ProcessError> {
    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| ProcessError::ModelLoad("GEMINI_API_KEY environment variable must be set".to_string()))?;
    let client = gemini::Client::new(&api_key);
    RateLimitedEmbeddingModel::per_minute(
        client.embedding_model(gemini::embedding::EMBEDDING_004),
        requests_per_minute,
    )
}
