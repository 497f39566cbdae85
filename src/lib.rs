//! # herald - News Ingestion with Classification and Semantic Retrieval
//!
//! herald polls a list of news feeds, resolves each entry's full text,
//! drops articles it has already seen, assigns every new article one of four
//! subject categories, condenses it into an extractive summary, stores it,
//! and indexes its embedding for similarity search.
//!
//! ## Features
//!
//! - Concurrent, failure-isolated feed fetching (RSS, Atom and JSON Feed)
//! - Content-derived article ids; re-running a cycle never duplicates records
//! - Model-backed or keyword classification behind one `Classifier` contract
//! - TextRank extractive summaries
//! - Embeddings through `rig` (local all-MiniLM-L6-v2 via fastembed, or Gemini)
//! - Article storage with LibSQL, paginated listings by category
//! - Cosine similarity search over libsql's native vector index
//!
//! ## Example
//!
//! ```rust,no_run
//! use herald::config::HeraldConfig;
//! use herald::index::Database;
//! use herald::ingest::Pipeline;
//! use herald::model::FastEmbedModel;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HeraldConfig::default();
//!     let db = Database::new_from_path("herald.db", config.processor.embedding.dimensions).await?;
//!     let model = FastEmbedModel::try_new(None)?;
//!     let pipeline = Pipeline::from_config(&config, model, db)?;
//!
//!     pipeline.rebuild_index().await?;
//!     let new_articles = pipeline.run_ingestion_cycle().await?;
//!     println!("{new_articles} new articles");
//!     Ok(())
//! }
//! ```

pub mod article;
pub mod config;
pub mod crawler;
mod error;
pub mod index;
pub mod ingest;
pub mod model;
pub mod processor;
pub mod search;

pub use error::{Error, Result};

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::article::{Article, ArticleId, Category};
    pub use crate::error::Error;
    pub use crate::error::Result;
}
