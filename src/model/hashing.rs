//! Stub embedding model based on signed feature hashing.
//!
//! Used by the tests and by the `hashing` provider for runs that cannot
//! download a model. It only captures shared vocabulary, not meaning.
//!
//! Word unigrams and bigrams of the lower-cased text are hashed with SHA-256;
//! the first eight digest bytes pick a bucket and the ninth byte picks the
//! sign. Texts sharing vocabulary land close together under cosine similarity,
//! with no network access and fully deterministic output.

use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct HashingEmbeddingModel {
    dimensions: usize,
}

impl HashingEmbeddingModel {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Raw (unnormalized) feature vector for one text
    pub fn embed_one(&self, text: &str) -> Vec<f64> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();

        let mut vec = vec![0.0f64; self.dimensions];
        let bigrams = words.windows(2).map(|pair| format!("{} {}", pair[0], pair[1]));
        for feature in words.iter().cloned().chain(bigrams) {
            let digest = Sha256::digest(feature.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vec[bucket] += sign;
        }
        vec
    }
}

impl EmbeddingModel for HashingEmbeddingModel {
    const MAX_DOCUMENTS: usize = 1024;

    fn ndims(&self) -> usize {
        self.dimensions
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(texts
            .into_iter()
            .map(|document| {
                let vec = self.embed_one(&document);
                Embedding { document, vec }
            })
            .collect())
    }
}
