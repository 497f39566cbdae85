//! Local sentence embeddings with fastembed.
//!
//! Runs all-MiniLM-L6-v2 (384 dimensions) on the CPU through ONNX Runtime.
//! The model files are downloaded into the cache directory on first use.

use std::path::Path;
use std::sync::{Arc, Mutex};

use fastembed::{InitOptions, TextEmbedding};
use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use tracing::{debug, info};

use crate::processor::ProcessError;

/// Output dimension of all-MiniLM-L6-v2
pub const MINILM_DIMENSIONS: usize = 384;

/// all-MiniLM-L6-v2 behind rig's `EmbeddingModel` trait.
///
/// `TextEmbedding::embed` needs exclusive access, so the model sits behind a
/// mutex and inference runs on the blocking thread pool.
#[derive(Clone)]
pub struct FastEmbedModel {
    inner: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedModel {
    /// Load the model, downloading it into `cache_dir` (or fastembed's
    /// default cache) when it is not there yet
    pub fn try_new(cache_dir: Option<&Path>) -> Result<Self, ProcessError> {
        let mut options =
            InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir.to_path_buf());
        }

        let model = TextEmbedding::try_new(options)
            .map_err(|e| ProcessError::ModelLoad(format!("Failed to load all-MiniLM-L6-v2: {}", e)))?;
        info!("all-MiniLM-L6-v2 loaded");

        Ok(Self {
            inner: Arc::new(Mutex::new(model)),
        })
    }
}

impl EmbeddingModel for FastEmbedModel {
    const MAX_DOCUMENTS: usize = 256;

    fn ndims(&self) -> usize {
        MINILM_DIMENSIONS
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let documents: Vec<String> = texts.into_iter().collect();
        debug!(documents = documents.len(), "fastembed: embedding batch");

        let inner = Arc::clone(&self.inner);
        let batch = documents.clone();
        let vectors = tokio::task::spawn_blocking(move || {
            let mut model = inner
                .lock()
                .map_err(|_| EmbeddingError::ProviderError("embedding model lock poisoned".to_string()))?;
            model
                .embed(batch, None)
                .map_err(|e| EmbeddingError::ProviderError(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::ProviderError(format!("embedding task failed: {}", e)))??;

        Ok(documents
            .into_iter()
            .zip(vectors)
            .map(|(document, vec)| Embedding {
                document,
                vec: vec.into_iter().map(f64::from).collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmbeddingConversion;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (na * nb)
    }

    #[tokio::test]
    #[ignore = "downloads all-MiniLM-L6-v2"]
    async fn test_synonyms_are_close() {
        let model = FastEmbedModel::try_new(None).unwrap();
        let out = model
            .embed_texts(vec![
                "a car parked on the street".to_string(),
                "an automobile parked on the road".to_string(),
                "the central bank raised interest rates".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].vec.len(), MINILM_DIMENSIONS);
        let (car, automobile, bank) = (out[0].to_vec(), out[1].to_vec(), out[2].to_vec());
        assert!(cosine(&car, &automobile) > cosine(&car, &bank));
        assert!(cosine(&car, &automobile) > 0.6);
    }
}
