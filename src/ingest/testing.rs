//! Shared fixtures for pipeline tests: a mock news site and a pipeline over a
//! temporary database.

use mockito::{Server, ServerGuard};
use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use tempfile::TempDir;

use crate::crawler::{FeedSource, FetchConfig};
use crate::index::Database;
use crate::ingest::Pipeline;
use crate::model::HashingEmbeddingModel;
use crate::processor::ProcessorConfig;

pub const ECONOMY: &str = "The rupee gained sharply against the dollar on Monday as foreign investors poured money into local equity markets. \
    Traders said the central bank had stepped back from the currency market and allowed the exchange rate to find its own level. \
    Analysts expect the economy to benefit from lower import costs if the rupee holds its gains through the coming months.";

pub const POLITY: &str = "Parliament passed the amendment bill after a long debate on the constitution and the powers of state governments. \
    Opposition members argued that the bill weakened federal governance and demanded that it be sent to a select committee. \
    The government said the policy would simplify administration and promised consultations with the states before rules are framed.";

/// Article page with one paragraph per sentence and a navigation bar
pub fn html(body: &str) -> String {
    let paragraphs: String = body
        .split(". ")
        .map(|p| format!("<p>{}.</p>", p.trim_end_matches('.')))
        .collect();
    format!(
        "<html><body><nav><p>Home World India Business Sport Opinion Videos Photos Podcasts Newsletters Weather</p></nav><article>{paragraphs}</article></body></html>"
    )
}

/// RSS document with one item per `(title, path)`, all published on the same day
pub fn rss_with(server_url: &str, items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .enumerate()
        .map(|(n, (title, path))| {
            format!(
                "<item><title>{title}</title><link>{server_url}{path}</link><pubDate>Mon, 03 Mar 2025 10:{n:02}:00 GMT</pubDate></item>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Wire</title><link>{server_url}</link><description>d</description>{items}</channel></rss>"
    )
}

/// Three items, two of which share a headline
pub fn rss(server_url: &str) -> String {
    rss_with(
        server_url,
        &[
            ("Rupee gains against dollar", "/a"),
            ("Rupee  gains against dollar", "/b"),
            ("Parliament passes amendment bill", "/c"),
        ],
    )
}

/// Mock site serving the feed at `/feed` and its article pages
pub async fn news_server() -> ServerGuard {
    let mut server = Server::new_async().await;
    let url = server.url();
    server
        .mock("GET", "/feed")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(rss(&url))
        .create_async()
        .await;
    for (path, body) in [("/a", ECONOMY), ("/b", ECONOMY), ("/c", POLITY)] {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(html(body))
            .create_async()
            .await;
    }
    server
}

/// Pipeline with default configuration over `dir/herald.db`
pub async fn pipeline(sources: Vec<FeedSource>, dir: &TempDir) -> Pipeline<HashingEmbeddingModel> {
    let model = HashingEmbeddingModel::new(ProcessorConfig::default().embedding.dimensions);
    pipeline_with_model(sources, dir, model).await
}

/// Pipeline with default configuration and the given embedding model
pub async fn pipeline_with_model<E>(sources: Vec<FeedSource>, dir: &TempDir, model: E) -> Pipeline<E>
where
    E: EmbeddingModel + 'static,
{
    let processor = ProcessorConfig::default();
    let path = dir.path().join("herald.db").to_string_lossy().to_string();
    let db = Database::new_from_path(&path, processor.embedding.dimensions)
        .await
        .unwrap();
    Pipeline::new(sources, FetchConfig::default(), &processor, model, db).unwrap()
}

/// Hashing model that returns a zero vector for any text containing `marker`
#[derive(Debug, Clone)]
pub struct ZeroForModel {
    inner: HashingEmbeddingModel,
    marker: &'static str,
}

impl ZeroForModel {
    pub fn new(marker: &'static str) -> Self {
        Self {
            inner: HashingEmbeddingModel::new(ProcessorConfig::default().embedding.dimensions),
            marker,
        }
    }
}

impl EmbeddingModel for ZeroForModel {
    const MAX_DOCUMENTS: usize = 16;

    fn ndims(&self) -> usize {
        self.inner.ndims()
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(texts
            .into_iter()
            .map(|document| {
                let vec = if document.contains(self.marker) {
                    vec![0.0; self.inner.ndims()]
                } else {
                    self.inner.embed_one(&document)
                };
                Embedding { document, vec }
            })
            .collect())
    }
}
