//! # Semantic Search Module
//!
//! Retrieval over ingested articles: the query text is embedded with the
//! pipeline's model, matched against the vector index, and the hits are
//! resolved into stored articles.
//!
//! ## Search Process
//!
//! 1. Convert the query to a normalized embedding
//! 2. Rank stored vectors by cosine similarity with libsql's `vector_top_k`
//! 3. Resolve positions to article ids, then ids to stored articles
//! 4. Apply the optional category filter and the result limit

mod error;

pub use error::SearchError;

use std::collections::HashMap;

use rig::embeddings::EmbeddingModel;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::article::{Article, Category};
use crate::ingest::Pipeline;

/// Options for a search
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results
    pub limit: usize,

    /// Only return articles of this category
    pub category: Option<Category>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            category: None,
        }
    }
}

/// A stored article with its similarity to the query
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub article: Article,
    pub score: f32,
}

/// Find the stored articles most similar to `query`, best first
#[instrument(skip(pipeline))]
pub async fn search_articles<E>(
    pipeline: &Pipeline<E>,
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchResult>, SearchError>
where
    E: EmbeddingModel + 'static,
{
    if query.trim().is_empty() {
        return Err(SearchError::InvalidParameters("query is empty".to_string()));
    }
    if options.limit == 0 {
        return Err(SearchError::InvalidParameters("limit must be positive".to_string()));
    }

    let vector = pipeline
        .embed(query)
        .await
        .map_err(|e| SearchError::Embedding(e.to_string()))?;

    // A category filter is applied after ranking, so rank everything
    let k = match options.category {
        Some(_) => pipeline.index_len().await,
        None => options.limit,
    };
    let hits = pipeline
        .similarity_hits(&vector, k)
        .await
        .map_err(|e| SearchError::Index(e.to_string()))?;

    let scores: HashMap<_, _> = hits.iter().map(|hit| (hit.article_id.clone(), hit.score)).collect();
    let ids: Vec<_> = hits.into_iter().map(|hit| hit.article_id).collect();
    let articles = pipeline.database().get_articles(&ids).await?;

    let results: Vec<SearchResult> = articles
        .into_iter()
        .filter(|article| options.category.is_none_or(|c| article.category == c))
        .take(options.limit)
        .map(|article| SearchResult {
            score: scores.get(&article.id).copied().unwrap_or_default(),
            article,
        })
        .collect();

    debug!(results = results.len(), "search complete");
    Ok(results)
}
