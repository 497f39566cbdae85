use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use tracing::{Instrument, debug_span, info_span};

use crate::processor::ProcessError;

/// Embedding model that waits for a rate limiter before every request
#[derive(Clone)]
pub struct RateLimitedEmbeddingModel<M: EmbeddingModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimitedEmbeddingModel<M>
where
    M: EmbeddingModel,
{
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }

    /// Allow at most `requests_per_minute` embedding requests
    pub fn per_minute(model: M, requests_per_minute: u32) -> Result<Self, ProcessError> {
        let quota = NonZeroU32::new(requests_per_minute)
            .ok_or_else(|| ProcessError::Other("embedding rate limit must be positive".to_string()))?;
        Ok(Self::new(model, RateLimiter::direct(Quota::per_minute(quota))))
    }
}

impl<M: EmbeddingModel> EmbeddingModel for RateLimitedEmbeddingModel<M> {
    const MAX_DOCUMENTS: usize = M::MAX_DOCUMENTS;

    fn ndims(&self) -> usize {
        self.model.ndims()
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        self.limiter.until_ready().instrument(debug_span!("limiter")).await;
        self.model.embed_texts(texts).instrument(info_span!("embed_texts")).await
    }
}
