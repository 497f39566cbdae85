//! # Processor Configuration Module
//!
//! Configuration for the per-article processing stages: classification,
//! summarization and embedding.
//!
//! ## Key Components
//!
//! - `ClassifierConfig`: model location, keyword lists and the fallback category
//! - `SummarizerConfig`: skip threshold and sentence cap
//! - `EmbeddingConfig`: provider, vector dimension and provider rate limit
//! - `ProcessorConfig`: all of the above, with a builder for programmatic use
//!
//! The keyword lists are only consulted when no classification model is
//! available, and the embedding dimension must match the chosen provider.

use crate::article::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration for article classification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Path to a sequence classification model file. When unset or unloadable
    /// the keyword classifier is used instead.
    pub model_path: Option<PathBuf>,

    /// Category returned when model inference fails
    pub default_category: Category,

    /// Keywords counted per category by the keyword classifier
    pub keywords: BTreeMap<Category, Vec<String>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let keywords = [
            (Category::Gs1, ["history", "culture", "heritage", "art", "geography", "society"]),
            (Category::Gs2, ["governance", "constitution", "polity", "international", "relations", "policy"]),
            (Category::Gs3, ["economy", "technology", "environment", "security", "disaster", "development"]),
            (Category::Gs4, ["ethics", "integrity", "aptitude", "moral", "values", "attitude"]),
        ]
        .into_iter()
        .map(|(category, words)| (category, words.iter().map(|w| w.to_string()).collect()))
        .collect();

        Self {
            model_path: None,
            default_category: Category::Gs2,
            keywords,
        }
    }
}

/// Configuration for summarization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Texts with fewer words than this are returned unchanged
    pub min_words: usize,

    /// Maximum number of sentences kept in a summary
    pub max_sentences: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            min_words: 50,
            max_sentences: 4,
        }
    }
}

/// Which embedding model backs the vector index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// all-MiniLM-L6-v2 through fastembed (384 dimensions), runs locally
    #[default]
    Local,
    /// Feature-hashing stub, no model download
    Hashing,
    /// Gemini text-embedding-004 (768 dimensions), needs GEMINI_API_KEY
    Gemini,
}

/// Configuration for embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,

    /// Dimension `d` of every vector in the index
    pub dimensions: usize,

    /// Request budget for remote providers
    pub requests_per_minute: u32,

    /// Where the local model files are cached; fastembed's default when unset
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Local,
            dimensions: 384,
            requests_per_minute: 1000,
            cache_dir: None,
        }
    }
}

/// Configuration for the processor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub classifier: ClassifierConfig,
    pub summarizer: SummarizerConfig,
    pub embedding: EmbeddingConfig,
}

/// Builder for ProcessorConfig
#[derive(Debug, Default)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ProcessorConfig::default(),
        }
    }

    /// Set the classification model path
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.classifier.model_path = Some(path.into());
        self
    }

    /// Set the category used when inference fails
    pub fn default_category(mut self, category: Category) -> Self {
        self.config.classifier.default_category = category;
        self
    }

    /// Replace the keyword list of one category
    pub fn keywords(mut self, category: Category, keywords: Vec<String>) -> Self {
        self.config.classifier.keywords.insert(category, keywords);
        self
    }

    /// Set the summarization skip threshold
    pub fn summary_min_words(mut self, min_words: usize) -> Self {
        self.config.summarizer.min_words = min_words;
        self
    }

    /// Set the number of sentences kept in a summary
    pub fn summary_sentences(mut self, max_sentences: usize) -> Self {
        self.config.summarizer.max_sentences = max_sentences;
        self
    }

    /// Set the embedding provider
    pub fn embedding_provider(mut self, provider: EmbeddingProvider) -> Self {
        self.config.embedding.provider = provider;
        self
    }

    /// Set the embedding dimensions
    pub fn embedding_dimensions(mut self, dimensions: usize) -> Self {
        self.config.embedding.dimensions = dimensions;
        self
    }

    /// Set the local model cache directory
    pub fn embedding_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.embedding.cache_dir = Some(dir.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> ProcessorConfig {
        self.config
    }
}

impl ProcessorConfig {
    /// Create a new builder
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::new()
    }
}
