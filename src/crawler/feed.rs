//! Feed fetching: pulls one RSS/Atom/JSON feed and returns its raw entries

use std::collections::HashSet;

use reqwest::header::USER_AGENT;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::article::normalize_title;
use crate::crawler::error::FetchError;
use crate::crawler::{FeedEntry, FeedSource, FetchConfig};

/// Fetches and parses feeds
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl FeedFetcher {
    /// Create a fetcher with its own HTTP client
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a fetcher sharing an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// Fetch the entries of one feed.
    ///
    /// Failures are logged and produce an empty batch so one broken source
    /// never affects the others.
    #[instrument(skip(self, source), fields(source = %source.label))]
    pub async fn fetch(&self, source: &FeedSource) -> Vec<FeedEntry> {
        match self.try_fetch(source).await {
            Ok(entries) => {
                info!(url = %source.url, entries = entries.len(), "feed: fetched");
                entries
            }
            Err(e) => {
                warn!(url = %source.url, error = %e, "feed: fetch failed, skipping source");
                Vec::new()
            }
        }
    }

    /// Fetch the entries of one feed, surfacing the failure
    pub async fn try_fetch(&self, source: &FeedSource) -> Result<Vec<FeedEntry>, FetchError> {
        let response = self
            .client
            .get(&source.url)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: source.url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let entries = parse_feed(&bytes, self.config.max_entries_per_source)?;

        // Relative links resolve against the feed address
        let base = Url::parse(&source.url)?;
        Ok(entries
            .into_iter()
            .filter_map(|mut entry| match base.join(&entry.link) {
                Ok(link) => {
                    entry.link = link.to_string();
                    Some(entry)
                }
                Err(e) => {
                    warn!(link = %entry.link, error = %e, "feed: unusable entry link, skipping entry");
                    None
                }
            })
            .collect())
    }
}

/// Parse a feed body into at most `max_entries` entries.
///
/// The cap is applied in feed order first, then entries whose normalized title
/// repeats an earlier one in the same batch are dropped.
pub fn parse_feed(body: &[u8], max_entries: usize) -> Result<Vec<FeedEntry>, FetchError> {
    let feed = feed_rs::parser::parse(body)?;

    let mut seen_titles = HashSet::new();
    let mut entries = Vec::new();

    for entry in feed.entries.into_iter().take(max_entries) {
        let Some(title) = entry.title.map(|t| normalize_title(&t.content)) else {
            debug!(id = %entry.id, "feed: entry without title");
            continue;
        };
        if title.is_empty() {
            continue;
        }

        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()));
        let Some(link) = link else {
            debug!(%title, "feed: entry without link");
            continue;
        };

        if !seen_titles.insert(title.clone()) {
            debug!(%title, "feed: duplicate title in batch");
            continue;
        }

        entries.push(FeedEntry {
            title,
            link,
            published: entry.published,
            updated: entry.updated,
            summary: entry.summary.map(|t| t.content),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn rss(items: &[(&str, &str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(title, link, date)| {
                format!(
                    "<item><title>{title}</title><link>{link}</link><pubDate>{date}</pubDate><description>Teaser</description></item>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Test</title><link>https://news.example</link><description>d</description>{items}</channel></rss>"
        )
    }

    #[test]
    fn test_parse_feed_suppresses_duplicate_titles() {
        let body = rss(&[
            ("Budget passed", "https://news.example/a", "Mon, 03 Mar 2025 10:00:00 GMT"),
            ("  Budget   passed ", "https://news.example/b", "Mon, 03 Mar 2025 11:00:00 GMT"),
            ("Rain forecast", "https://news.example/c", "Mon, 03 Mar 2025 12:00:00 GMT"),
        ]);

        let entries = parse_feed(body.as_bytes(), 20).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Budget passed");
        assert_eq!(entries[0].link, "https://news.example/a");
        assert!(entries[0].published.is_some());
        assert_eq!(entries[1].title, "Rain forecast");
    }

    #[test]
    fn test_parse_feed_caps_entries() {
        let items: Vec<(String, String)> = (0..30)
            .map(|i| (format!("Story {i}"), format!("https://news.example/{i}")))
            .collect();
        let refs: Vec<(&str, &str, &str)> = items
            .iter()
            .map(|(t, l)| (t.as_str(), l.as_str(), "Mon, 03 Mar 2025 10:00:00 GMT"))
            .collect();

        let entries = parse_feed(rss(&refs).as_bytes(), 20).unwrap();
        assert_eq!(entries.len(), 20);
        assert_eq!(entries[19].title, "Story 19");
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        assert!(parse_feed(b"this is not a feed", 20).is_err());
    }

    #[tokio::test]
    async fn test_fetch_unreachable_or_failing_source_is_empty() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/feed")
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let fetcher = FeedFetcher::new(FetchConfig::default()).unwrap();
        let source = FeedSource::new("Broken", format!("{}/feed", server.url()));
        assert!(fetcher.fetch(&source).await.is_empty());
        assert!(matches!(
            fetcher.try_fetch(&source).await,
            Err(FetchError::Status { status: 500, .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let mut server = Server::new_async().await;
        let body = rss(&[("Only story", "https://news.example/1", "Mon, 03 Mar 2025 10:00:00 GMT")]);
        let mock = server
            .mock("GET", "/feed")
            .match_header("user-agent", "herald-test")
            .with_status(200)
            .with_header("content-type", "application/rss+xml")
            .with_body(body)
            .create_async()
            .await;

        let fetcher = FeedFetcher::new(FetchConfig::builder().user_agent("herald-test").build()).unwrap();
        let source = FeedSource::new("Test", format!("{}/feed", server.url()));
        let entries = fetcher.fetch(&source).await;

        assert_eq!(entries.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_resolves_relative_links() {
        let mut server = Server::new_async().await;
        let body = rss(&[("Relative story", "/news/1.html", "Mon, 03 Mar 2025 10:00:00 GMT")]);
        server
            .mock("GET", "/rss/feed.xml")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let fetcher = FeedFetcher::new(FetchConfig::default()).unwrap();
        let source = FeedSource::new("Test", format!("{}/rss/feed.xml", server.url()));
        let entries = fetcher.try_fetch(&source).await.unwrap();

        assert_eq!(entries[0].link, format!("{}/news/1.html", server.url()));
    }

    #[tokio::test]
    async fn test_unusable_link_skips_only_that_entry() {
        let mut server = Server::new_async().await;
        let body = rss(&[
            ("Good story", "/news/1.html", "Mon, 03 Mar 2025 10:00:00 GMT"),
            ("Broken story", "http://[oops", "Mon, 03 Mar 2025 11:00:00 GMT"),
        ]);
        server
            .mock("GET", "/feed")
            .with_status(200)
            .with_body(body)
            .expect(2)
            .create_async()
            .await;

        let fetcher = FeedFetcher::new(FetchConfig::default()).unwrap();
        let source = FeedSource::new("Test", format!("{}/feed", server.url()));

        let entries = fetcher.try_fetch(&source).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Good story");
        assert_eq!(fetcher.fetch(&source).await.len(), 1);
    }

    #[test]
    fn test_atom_updated_is_kept_apart_from_published() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
            <feed xmlns="http://www.w3.org/2005/Atom">
              <title>Wire</title><id>urn:wire</id><updated>2025-03-04T09:00:00Z</updated>
              <entry>
                <title>Edited story</title><id>urn:wire:1</id>
                <link href="https://news.example/1"/>
                <updated>2025-03-04T09:00:00Z</updated>
              </entry>
              <entry>
                <title>Dated story</title><id>urn:wire:2</id>
                <link href="https://news.example/2"/>
                <published>2025-03-03T08:00:00Z</published>
                <updated>2025-03-04T09:00:00Z</updated>
              </entry>
            </feed>"#;

        let entries = parse_feed(body.as_bytes(), 20).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].published.is_none());
        assert!(entries[0].updated.is_some());
        assert!(entries[1].published.is_some());
        assert_ne!(entries[1].published, entries[1].updated);
    }
}
