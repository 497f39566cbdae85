//! # Feed Crawler Module
//!
//! This module gathers raw material for the ingestion pipeline. It is the
//! first stage of every ingestion cycle.
//!
//! ## Key Components
//!
//! - `FeedFetcher`: pulls one feed source and returns a bounded, title-deduplicated batch of entries
//! - `ContentExtractor`: resolves an entry's full body text from its link
//! - `FetchConfig`: timeouts, user agent, entry caps and word-count thresholds
//!
//! ## Failure Model
//!
//! Neither component ever fails the caller. An unreachable or malformed feed
//! yields an empty batch, and an article page that cannot be fetched or is too
//! short yields `None`. Both cases are logged.

mod config;
mod content_extraction;
mod error;
mod feed;

pub use config::{FetchConfig, FetchConfigBuilder};
pub use content_extraction::{ContentExtractor, extract_article_text};
pub use error::FetchError;
pub use feed::{FeedFetcher, parse_feed};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named feed to poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    /// Label stored with every article from this feed
    pub label: String,

    /// Address of the RSS/Atom/JSON feed
    pub url: String,
}

impl FeedSource {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// A raw entry as it appears in a feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Normalized headline
    pub title: String,

    /// Link to the full article
    pub link: String,

    /// Publication time supplied by the feed; part of the article id
    pub published: Option<DateTime<Utc>>,

    /// Last update time supplied by the feed. It can move when an entry is
    /// edited, so it is only used as a display date.
    pub updated: Option<DateTime<Utc>>,

    /// Teaser text carried by the feed, if any
    pub summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_source_roundtrips_through_json() {
        let source = FeedSource::new("The Hindu", "https://www.thehindu.com/news/national/feeder/default.rss");
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains("\"label\":\"The Hindu\""));
        let back: FeedSource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, source);
    }
}
