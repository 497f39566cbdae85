//! # Application Configuration
//!
//! `HeraldConfig` is read from a JSON file. Every section and field has a
//! default, so an empty object (or no file at all) is a valid configuration.
//!
//! ```json
//! {
//!   "database": "herald.db",
//!   "sources": [{ "label": "The Hindu", "url": "https://www.thehindu.com/news/national/feeder/default.rss" }],
//!   "fetch": { "timeout_secs": 10, "max_entries_per_source": 20 },
//!   "processor": {
//!     "classifier": { "model_path": "models/gs_classifier.json", "default_category": "GS2" },
//!     "summarizer": { "max_sentences": 4 },
//!     "embedding": { "provider": "local", "dimensions": 384 }
//!   },
//!   "schedule": { "interval_mins": 60 },
//!   "recent_window_days": 3
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crawler::{FeedSource, FetchConfig};
use crate::error::{Error, Result};
use crate::processor::ProcessorConfig;

/// Periodic ingestion schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minutes between ingestion cycles
    pub interval_mins: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { interval_mins: 60 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    /// Path of the libsql database file
    pub database: PathBuf,

    /// Feeds to poll, in order
    pub sources: Vec<FeedSource>,

    pub fetch: FetchConfig,

    pub processor: ProcessorConfig,

    pub schedule: ScheduleConfig,

    /// Window, in days, of the default article listing
    pub recent_window_days: i64,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("herald.db"),
            sources: default_sources(),
            fetch: FetchConfig::default(),
            processor: ProcessorConfig::default(),
            schedule: ScheduleConfig::default(),
            recent_window_days: 3,
        }
    }
}

fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new("The Hindu", "https://www.thehindu.com/news/national/feeder/default.rss"),
        FeedSource::new("Indian Express", "https://indianexpress.com/section/india/feed/"),
        FeedSource::new("Times of India", "https://timesofindia.indiatimes.com/rssfeedstopstories.cms"),
    ]
}

impl HeraldConfig {
    /// Read a configuration file
    pub async fn read_config(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&config).map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Read `path` if given, otherwise use the defaults
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read_config(path).await,
            None => Ok(Self::default()),
        }
    }

    /// The recent window as a duration
    pub fn recent_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.recent_window_days.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Category;
    use crate::processor::EmbeddingProvider;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HeraldConfig::default();
        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.sources[0].label, "The Hindu");
        assert_eq!(config.schedule.interval_mins, 60);
        assert_eq!(config.recent_window(), chrono::Duration::days(3));
        assert_eq!(config.processor.embedding.dimensions, 384);
        assert_eq!(config.processor.embedding.provider, EmbeddingProvider::Local);
        assert!(config.processor.embedding.cache_dir.is_none());
    }

    #[test]
    fn test_hashing_provider_is_selectable() {
        let json = r#"{ "processor": { "embedding": { "provider": "hashing", "cache_dir": "/var/cache/herald" } } }"#;
        let config: HeraldConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.processor.embedding.provider, EmbeddingProvider::Hashing);
        assert_eq!(config.processor.embedding.dimensions, 384);
        assert_eq!(
            config.processor.embedding.cache_dir,
            Some(PathBuf::from("/var/cache/herald"))
        );
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r#"{
            "sources": [{ "label": "Wire", "url": "https://wire.example/rss" }],
            "fetch": { "timeout_secs": 5 },
            "processor": {
                "classifier": { "default_category": "GS4" },
                "embedding": { "provider": "gemini", "dimensions": 768 }
            }
        }"#;
        let config: HeraldConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.sources, vec![FeedSource::new("Wire", "https://wire.example/rss")]);
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.fetch.max_entries_per_source, 20);
        assert_eq!(config.processor.classifier.default_category, Category::Gs4);
        assert_eq!(config.processor.classifier.keywords.len(), 4);
        assert_eq!(config.processor.embedding.provider, EmbeddingProvider::Gemini);
        assert_eq!(config.processor.summarizer.max_sentences, 4);
        assert_eq!(config.database, PathBuf::from("herald.db"));
    }

    #[tokio::test]
    async fn test_read_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "database": "/tmp/news.db", "schedule": { "interval_mins": 15 } }"#)
            .unwrap();

        let config = HeraldConfig::load(Some(file.path())).await.unwrap();
        assert_eq!(config.database, PathBuf::from("/tmp/news.db"));
        assert_eq!(config.schedule.interval_mins, 15);

        assert!(HeraldConfig::read_config("/nonexistent/herald.json").await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "processor": { "classifier": { "default_category": "GS9" } } }"#)
            .unwrap();
        assert!(matches!(HeraldConfig::read_config(file.path()).await, Err(Error::Config(_))));
    }
}
