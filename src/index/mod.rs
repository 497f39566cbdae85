//! # Article Index Module
//!
//! Durable storage of processed articles and similarity search over their
//! embeddings.
//!
//! ## Key Components
//!
//! - `Database`: libsql-backed article store with idempotent batch upserts,
//!   paginated queries, and embeddings in an `F32_BLOB` column searched
//!   through libsql's vector index (`vector_top_k`)
//! - `VectorIndex`: the position → article map over the stored vectors
//! - `StoredArticle`, `UpsertReport`, `ArticleQuery`, `ArticlePage`: the
//!   store's inputs and outputs

mod database;
pub mod error;
mod schema;
pub mod vector;

pub use database::Database;
pub use error::{DbError, IndexError};
pub use vector::{Insertion, SearchHit, VectorIndex, l2_normalize};

use crate::article::{Article, ArticleId, Category};

/// An article together with its normalized embedding, persisted as one unit
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArticle {
    pub article: Article,
    pub embedding: Vec<f32>,
}

/// Outcome of `Database::upsert_many`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertReport {
    /// Newly stored articles with the position of their vector, in input order
    pub inserted: Vec<(ArticleId, u64)>,

    /// Articles already present; only their `last_updated` was refreshed
    pub existing: Vec<ArticleId>,

    /// Articles refused by a table constraint, with the reason
    pub rejected: Vec<(ArticleId, String)>,
}

/// A page request against the article store
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleQuery {
    /// Only this category, if set
    pub category: Option<Category>,

    /// 1-based page number
    pub page: usize,

    pub per_page: usize,

    /// Only articles ingested within this window, if set
    pub max_age: Option<chrono::Duration>,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            category: None,
            page: 1,
            per_page: 10,
            max_age: None,
        }
    }
}

/// One page of articles, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
}
