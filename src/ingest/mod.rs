//! # Ingestion Pipeline Module
//!
//! Drives one ingestion cycle from feed sources to the vector index.
//!
//! ## Stages
//!
//! `Fetching → Extracting → Deduping → Processing → Persisting → Indexing → Done`
//!
//! - Fetching fans out one task per source, bounded by a semaphore, and
//!   merges results in source order
//! - Every later stage runs sequentially per article; a failing article is
//!   logged and skipped
//! - Persisting commits the whole batch, articles and vectors, in one transaction
//! - Indexing records the stored vector positions while holding the index
//!   lock for the entire stage; a consistency violation aborts the run
//! - A pipeline whose index was never loaded rebuilds it before its first run
//!
//! ## Key Components
//!
//! - `Pipeline`: owns every collaborator of a run (fetcher, extractor,
//!   classifier, summarizer, embedder, index and store); at most one run at a time
//! - `RunSummary`: per-stage counts of a finished cycle

mod error;
#[cfg(test)]
pub(crate) mod testing;

pub use error::IngestError;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future;
use rig::embeddings::EmbeddingModel;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tracing::{debug, error, info, instrument, warn};

use crate::article::{Article, ArticleId};
use crate::config::HeraldConfig;
use crate::crawler::{ContentExtractor, FeedEntry, FeedFetcher, FeedSource, FetchConfig};
use crate::index::{Database, SearchHit, StoredArticle, VectorIndex};
use crate::processor::{
    Classifier, Embedder, ProcessorConfig, Summarizer, TextRankSummarizer, select_classifier,
};

/// Stage of an ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Extracting,
    Deduping,
    Processing,
    Persisting,
    Indexing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Deduping => "deduping",
            Stage::Processing => "processing",
            Stage::Persisting => "persisting",
            Stage::Indexing => "indexing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Counts for one finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries returned by all feeds
    pub fetched: usize,
    /// Entries whose full text was extracted
    pub extracted: usize,
    /// Entries dropped as already known
    pub duplicates: usize,
    /// Entries dropped because embedding failed
    pub failed: usize,
    /// Newly persisted articles
    pub inserted: usize,
    /// Articles the store already had
    pub existing: usize,
    /// Articles refused by the store
    pub rejected: usize,
    /// Vectors added to the index
    pub indexed: usize,
}

struct Candidate {
    source: String,
    entry: FeedEntry,
    content: String,
}

/// Ingestion context: every collaborator of a run, owned in one place
pub struct Pipeline<E: EmbeddingModel> {
    sources: Vec<FeedSource>,
    max_concurrent_fetches: usize,
    fetcher: FeedFetcher,
    extractor: ContentExtractor,
    classifier: Box<dyn Classifier>,
    summarizer: Box<dyn Summarizer>,
    embedder: Embedder<E>,
    index: Mutex<VectorIndex>,
    db: Database,
    run_lock: Mutex<()>,
}

impl<E> Pipeline<E>
where
    E: EmbeddingModel + 'static,
{
    /// Assemble a pipeline. The classification strategy is chosen here, once.
    pub fn new(
        sources: Vec<FeedSource>,
        fetch: FetchConfig,
        processor: &ProcessorConfig,
        model: E,
        db: Database,
    ) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(fetch.timeout())
            .build()
            .map_err(|e| IngestError::Setup(format!("Failed to build HTTP client: {}", e)))?;

        let embedder = Embedder::new(model, processor.embedding.dimensions)?;
        let index = VectorIndex::new(embedder.dimensions());

        Ok(Self {
            sources,
            max_concurrent_fetches: fetch.max_concurrent_fetches.max(1),
            fetcher: FeedFetcher::with_client(client.clone(), fetch.clone()),
            extractor: ContentExtractor::with_client(client, fetch),
            classifier: select_classifier(&processor.classifier),
            summarizer: Box::new(TextRankSummarizer::new(processor.summarizer.clone())),
            embedder,
            index: Mutex::new(index),
            db,
            run_lock: Mutex::new(()),
        })
    }

    /// Assemble a pipeline from the application configuration
    pub fn from_config(config: &HeraldConfig, model: E, db: Database) -> Result<Self, IngestError> {
        Self::new(
            config.sources.clone(),
            config.fetch.clone(),
            &config.processor,
            model,
            db,
        )
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Number of vectors currently indexed
    pub async fn index_len(&self) -> usize {
        self.index.lock().await.len()
    }

    /// Run one cycle and return the number of newly persisted articles
    pub async fn run_ingestion_cycle(&self) -> Result<usize, IngestError> {
        Ok(self.run_cycle().await?.inserted)
    }

    /// Run one full ingestion cycle.
    ///
    /// Returns `IngestError::AlreadyRunning` without touching any state when
    /// another run (or a rebuild) is in progress.
    #[instrument(skip(self), fields(sources = self.sources.len()))]
    pub async fn run_cycle(&self) -> Result<RunSummary, IngestError> {
        let _running = self.run_lock.try_lock().map_err(|_| IngestError::AlreadyRunning)?;
        let index_ready = self.index.lock().await.is_ready();
        if !index_ready {
            self.rebuild_index_locked().await?;
        }
        let started = Utc::now();
        let mut summary = RunSummary::default();

        enter(Stage::Fetching);
        let batches = self.fetch_all().await;
        summary.fetched = batches.iter().map(|(_, entries)| entries.len()).sum();

        enter(Stage::Extracting);
        let mut candidates = Vec::new();
        for (source, entries) in batches {
            for entry in entries {
                match self.extractor.extract(&entry.link).await {
                    Some(content) => candidates.push(Candidate {
                        source: source.label.clone(),
                        entry,
                        content,
                    }),
                    None => debug!(link = %entry.link, "ingest: no usable text"),
                }
            }
        }
        summary.extracted = candidates.len();

        enter(Stage::Deduping);
        let mut seen = HashSet::new();
        let mut fresh = Vec::new();
        for candidate in candidates {
            let id = ArticleId::compute(&candidate.entry.title, &candidate.source, candidate.entry.published);
            if !seen.insert(id.clone()) || self.db.exists(&id).await? {
                summary.duplicates += 1;
                continue;
            }
            fresh.push((id, candidate));
        }

        enter(Stage::Processing);
        let mut batch = Vec::with_capacity(fresh.len());
        for (id, candidate) in fresh {
            match self.process(id, candidate, started).await {
                Some(stored) => batch.push(stored),
                None => summary.failed += 1,
            }
        }

        enter(Stage::Persisting);
        let report = self.db.upsert_many(&batch).await?;
        summary.inserted = report.inserted.len();
        summary.existing = report.existing.len();
        summary.rejected = report.rejected.len();

        enter(Stage::Indexing);
        {
            let mut index = self.index.lock().await;
            for (id, position) in &report.inserted {
                match index.insert(id.clone(), *position) {
                    Ok(insertion) if insertion.is_new() => summary.indexed += 1,
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, %id, "ingest: indexing halted");
                        return Err(e.into());
                    }
                }
            }
            index.check_consistency(self.db.vector_count().await?)?;
        }

        enter(Stage::Done);
        info!(
            fetched = summary.fetched,
            extracted = summary.extracted,
            duplicates = summary.duplicates,
            failed = summary.failed,
            inserted = summary.inserted,
            indexed = summary.indexed,
            "ingest: cycle complete"
        );
        Ok(summary)
    }

    /// Fetch every source concurrently, results in source order
    async fn fetch_all(&self) -> Vec<(FeedSource, Vec<FeedEntry>)> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_fetches));

        let tasks = self
            .sources
            .iter()
            .cloned()
            .map(|source| {
                let permit = semaphore.clone().acquire_owned();
                let fetcher = self.fetcher.clone();
                tokio::spawn(async move {
                    let _permit = permit.await;
                    let entries = fetcher.fetch(&source).await;
                    (source, entries)
                })
            })
            .collect::<Vec<_>>();

        let results = future::join_all(tasks).await;

        let mut batches = Vec::with_capacity(results.len());
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(batch) => batches.push(batch),
                Err(e) => warn!(source = %source.label, error = %e, "ingest: fetch task failed"),
            }
        }
        batches
    }

    /// Classify, summarize and embed one new article
    async fn process(&self, id: ArticleId, candidate: Candidate, started: DateTime<Utc>) -> Option<StoredArticle> {
        let Candidate { source, entry, content } = candidate;

        let category = self.classifier.classify(&content);
        let summary = self.summarizer.summarize(&content);
        let embedding = match self.embedder.embed(&content).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(%id, error = %e, "ingest: embedding failed, skipping article");
                return None;
            }
        };
        debug!(%id, %category, strategy = self.classifier.strategy(), "ingest: processed");

        Some(StoredArticle {
            article: Article {
                id,
                title: entry.title,
                link: entry.link,
                content,
                summary,
                date: entry.published.or(entry.updated).unwrap_or(started),
                category,
                source,
                last_updated: started,
            },
            embedding,
        })
    }

    /// Embed a query text with the pipeline's model
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, IngestError> {
        Ok(self.embedder.embed(text).await?)
    }

    /// Ids of the `k` stored articles most similar to `query`, best first
    pub async fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<ArticleId>, IngestError> {
        Ok(self
            .similarity_hits(query, k)
            .await?
            .into_iter()
            .map(|hit| hit.article_id)
            .collect())
    }

    /// Like `similarity_search`, keeping scores and positions
    pub async fn similarity_hits(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IngestError> {
        let index = self.index.lock().await;
        let query = index.prepare_query(query)?;
        if k == 0 || index.is_empty() {
            return Ok(Vec::new());
        }
        let ranked = self.db.nearest(&query, k).await?;
        Ok(index.resolve_hits(ranked))
    }

    /// Reset the index and reload the position of every stored vector
    #[instrument(skip(self))]
    pub async fn rebuild_index(&self) -> Result<usize, IngestError> {
        let _running = self.run_lock.try_lock().map_err(|_| IngestError::AlreadyRunning)?;
        self.rebuild_index_locked().await
    }

    async fn rebuild_index_locked(&self) -> Result<usize, IngestError> {
        let positions = self.db.load_positions().await?;

        let mut index = self.index.lock().await;
        index.reset();
        for (position, id) in positions {
            index.insert(id, position)?;
        }
        index.check_consistency(self.db.vector_count().await?)?;

        info!(vectors = index.len(), "ingest: index rebuilt");
        Ok(index.len())
    }

    /// Re-embed every stored article with the current model, store the new
    /// vectors and rebuild the index. Each finished article id is sent on
    /// `progress` when given.
    #[instrument(skip(self, progress))]
    pub async fn reembed_all(&self, progress: Option<mpsc::Sender<ArticleId>>) -> Result<usize, IngestError> {
        let _running = self.run_lock.try_lock().map_err(|_| IngestError::AlreadyRunning)?;

        let contents = self.db.load_contents().await?;
        info!("Found {} articles to reembed", contents.len());

        let mut reembedded = 0;
        for (id, content) in contents {
            match self.embedder.embed(&content).await {
                Ok(vector) => {
                    self.db.update_embedding(&id, &vector).await?;
                    reembedded += 1;
                }
                Err(e) => warn!(%id, error = %e, "ingest: failed to reembed article"),
            }
            if let Some(sender) = &progress {
                // Ignore errors from sending (e.g., if receiver is dropped)
                let _ = sender.send(id).await;
            }
        }

        self.rebuild_index_locked().await?;
        Ok(reembedded)
    }
}

fn enter(stage: Stage) {
    info!(%stage, "ingest: stage");
}
