//! # Article Processor Module
//!
//! Everything that happens to a single new article between deduplication and
//! persistence.
//!
//! ## Key Components
//!
//! - `Classifier` / `select_classifier`: assigns exactly one category
//! - `Summarizer` / `TextRankSummarizer`: extractive summary, identity on short texts
//! - `Embedder`: fixed-dimension, L2-normalized embedding vectors from any
//!   `rig` embedding model
//! - `ProcessorConfig`: configuration for the three stages

pub mod classifier;
mod config;
mod error;
pub mod sequence_model;
pub mod summarizer;

pub use classifier::{Classifier, KeywordClassifier, select_classifier};
pub use config::{
    ClassifierConfig, EmbeddingConfig, EmbeddingProvider, ProcessorConfig, ProcessorConfigBuilder,
    SummarizerConfig,
};
pub use error::{ClassifyError, ProcessError, SummarizeError};
pub use sequence_model::ModelClassifier;
pub use summarizer::{Summarizer, TextRankSummarizer};

use rig::embeddings::EmbeddingModel;
use tracing::instrument;

use crate::index::l2_normalize;
use crate::model::EmbeddingConversion;

/// Produces index-ready vectors of a fixed dimension
#[derive(Debug, Clone)]
pub struct Embedder<E: EmbeddingModel> {
    model: E,
    dimensions: usize,
}

impl<E: EmbeddingModel> Embedder<E> {
    /// Wrap a model, checking it produces `dimensions`-sized vectors
    pub fn new(model: E, dimensions: usize) -> Result<Self, ProcessError> {
        if model.ndims() != dimensions {
            return Err(ProcessError::DimensionMismatch {
                expected: dimensions,
                actual: model.ndims(),
            });
        }
        Ok(Self { model, dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text into a unit-length vector
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ProcessError> {
        let embedding = self
            .model
            .embed_texts(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(ProcessError::EmbeddingProcessing(
                "model returned no embedding".to_string(),
            ))?;

        let vec = embedding.to_vec();
        if vec.len() != self.dimensions {
            return Err(ProcessError::DimensionMismatch {
                expected: self.dimensions,
                actual: vec.len(),
            });
        }
        l2_normalize(&vec).ok_or(ProcessError::EmbeddingProcessing(
            "embedding has zero or non-finite norm".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HashingEmbeddingModel;
    use rig::embeddings::{Embedding, EmbeddingError};

    #[derive(Clone)]
    struct ZeroModel;

    impl EmbeddingModel for ZeroModel {
        const MAX_DOCUMENTS: usize = 16;

        fn ndims(&self) -> usize {
            4
        }

        async fn embed_texts(
            &self,
            texts: impl IntoIterator<Item = String> + Send,
        ) -> Result<Vec<Embedding>, EmbeddingError> {
            Ok(texts
                .into_iter()
                .map(|document| Embedding {
                    document,
                    vec: vec![0.0; 4],
                })
                .collect())
        }
    }

    #[test]
    fn test_processor_config() {
        let config = ProcessorConfig::builder()
            .summary_min_words(30)
            .summary_sentences(3)
            .embedding_dimensions(768)
            .embedding_provider(EmbeddingProvider::Gemini)
            .default_category(crate::article::Category::Gs3)
            .build();

        assert_eq!(config.summarizer.min_words, 30);
        assert_eq!(config.summarizer.max_sentences, 3);
        assert_eq!(config.embedding.dimensions, 768);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Gemini);
        assert_eq!(config.classifier.default_category, crate::article::Category::Gs3);
        assert!(config.classifier.model_path.is_none());
    }

    #[test]
    fn test_embedder_rejects_dimension_mismatch() {
        let result = Embedder::new(HashingEmbeddingModel::new(128), 384);
        assert!(matches!(
            result,
            Err(ProcessError::DimensionMismatch {
                expected: 384,
                actual: 128
            })
        ));
    }

    #[tokio::test]
    async fn test_embed_is_normalized_and_deterministic() {
        let embedder = Embedder::new(HashingEmbeddingModel::new(384), 384).unwrap();
        let a = embedder.embed("Monsoon session of parliament begins").await.unwrap();
        let b = embedder.embed("Monsoon session of parliament begins").await.unwrap();

        assert_eq!(a.len(), 384);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_embed_rejects_zero_vector() {
        let embedder = Embedder::new(ZeroModel, 4).unwrap();
        let result = embedder.embed("anything").await;
        assert!(matches!(result, Err(ProcessError::EmbeddingProcessing(_))));
    }
}
