//! Full-text extraction: resolves an article's body text from its link

use reqwest::header::USER_AGENT;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

use crate::article::word_count;
use crate::crawler::FetchConfig;
use crate::crawler::error::FetchError;

/// Fetches article pages and assembles their body text
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    client: reqwest::Client,
    config: FetchConfig,
}

impl ContentExtractor {
    /// Create an extractor with its own HTTP client
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create an extractor sharing an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// Resolve the body text of the article at `url`.
    ///
    /// Returns `None` on network failure, non-success status, or when the
    /// assembled text is too short to be worth classifying.
    #[instrument(skip(self))]
    pub async fn extract(&self, url: &str) -> Option<String> {
        let html = match self.fetch_page(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "extract: failed to fetch article page");
                return None;
            }
        };

        let text = extract_article_text(&html, &self.config);
        if text.is_none() {
            debug!("extract: article text below {} words", self.config.min_article_words);
        }
        text
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Assemble the article body from the paragraphs of an HTML page.
///
/// Paragraphs inside any of `config.exclude_tags` are ignored, as are
/// paragraphs of `config.min_paragraph_words` words or fewer. Returns `None`
/// when the joined text has fewer than `config.min_article_words` words.
pub fn extract_article_text(html: &str, config: &FetchConfig) -> Option<String> {
    let document = Html::parse_document(html);
    let paragraph = Selector::parse("p").ok()?;

    let blocks: Vec<String> = document
        .select(&paragraph)
        .filter(|p| !is_excluded(p, &config.exclude_tags))
        .map(|p| {
            p.text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|block| word_count(block) > config.min_paragraph_words)
        .collect();

    let text = blocks.join(" ");
    if word_count(&text) < config.min_article_words {
        return None;
    }
    Some(text)
}

fn is_excluded(element: &ElementRef<'_>, exclude_tags: &[String]) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|el| exclude_tags.iter().any(|tag| tag.eq_ignore_ascii_case(el.name())))
    })
}
