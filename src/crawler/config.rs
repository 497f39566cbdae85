//! # Fetch Configuration Module
//!
//! Configuration for the feed fetcher and the full-text extractor: request
//! timeout and identification, per-source entry caps, fan-out width and the
//! word-count thresholds that decide whether an article is worth keeping.
//!
//! ## Key Components
//!
//! - `FetchConfig`: The configuration struct, deserializable from the herald config file
//! - `FetchConfigBuilder`: Builder pattern implementation for programmatic use
//!
//! Every field has a default, so an empty `"fetch": {}` section is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for fetching feeds and article pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum number of entries taken from a single feed per run
    pub max_entries_per_source: usize,

    /// Maximum number of feeds fetched concurrently
    pub max_concurrent_fetches: usize,

    /// Timeout in seconds for every feed and article request
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Element names whose paragraphs are never part of the article body
    pub exclude_tags: Vec<String>,

    /// Paragraphs with this many words or fewer are treated as boilerplate
    pub min_paragraph_words: usize,

    /// Articles whose assembled text has fewer words than this are discarded
    pub min_article_words: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_entries_per_source: 20,
            max_concurrent_fetches: 8,
            timeout_secs: 10,
            user_agent: format!(
                "Mozilla/5.0 (compatible; herald/{}; +https://github.com/herald-news/herald)",
                env!("CARGO_PKG_VERSION")
            ),
            exclude_tags: vec![
                "script".to_string(),
                "style".to_string(),
                "nav".to_string(),
                "footer".to_string(),
                "iframe".to_string(),
                "noscript".to_string(),
            ],
            min_paragraph_words: 10,
            min_article_words: 50,
        }
    }
}

/// Builder for FetchConfig
#[derive(Debug, Default)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: FetchConfig::default(),
        }
    }

    /// Set the maximum number of entries per feed
    pub fn max_entries_per_source(mut self, max_entries: usize) -> Self {
        self.config.max_entries_per_source = max_entries;
        self
    }

    /// Set how many feeds are fetched at once
    pub fn max_concurrent_fetches(mut self, max_concurrent: usize) -> Self {
        self.config.max_concurrent_fetches = max_concurrent;
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the element names excluded from body extraction
    pub fn exclude_tags(mut self, exclude_tags: Vec<String>) -> Self {
        self.config.exclude_tags = exclude_tags;
        self
    }

    /// Set the paragraph word threshold
    pub fn min_paragraph_words(mut self, min_words: usize) -> Self {
        self.config.min_paragraph_words = min_words;
        self
    }

    /// Set the minimum article length in words
    pub fn min_article_words(mut self, min_words: usize) -> Self {
        self.config.min_article_words = min_words;
        self
    }

    /// Build the configuration
    pub fn build(self) -> FetchConfig {
        self.config
    }
}

impl FetchConfig {
    /// Create a new builder
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::new()
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
