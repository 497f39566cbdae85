//! # herald CLI Application
//!
//! Command-line interface to the herald ingestion pipeline.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Subcommands:
//!   - `run`: one ingestion cycle
//!   - `watch`: ingestion cycles on a fixed interval
//!   - `list`: paginated article listing by category
//!   - `search`: semantic search over ingested articles
//!   - `reindex`: rebuild the vector index, optionally re-embedding everything
//!
//! ## Features
//!
//! - JSON configuration with `--config`, database override with `--database`
//! - Embedding provider chosen by configuration
//! - Progress tracking for re-embedding
//! - Telemetry integration for monitoring
//! - Both JSON and text output formats

mod telemetry;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use herald::article::Category;
use herald::config::HeraldConfig;
use herald::index::{ArticlePage, ArticleQuery, Database};
use herald::ingest::{IngestError, Pipeline, RunSummary};
use herald::model::{FastEmbedModel, HashingEmbeddingModel, gemini_embedding_model};
use herald::processor::EmbeddingProvider;
use herald::search::{SearchOptions, search_articles};
use indicatif::{ProgressBar, ProgressStyle};
use rig::embeddings::EmbeddingModel;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};

#[derive(Parser)]
#[command(author, version, about = "Ingest, classify, summarize and search news feeds", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database path, overriding the configuration
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one ingestion cycle
    Run(RunArgs),

    /// Run ingestion cycles on a fixed interval
    Watch(WatchArgs),

    /// List stored articles
    List(ListArgs),

    /// Search stored articles by meaning
    Search(SearchArgs),

    /// Rebuild the vector index from stored embeddings
    Reindex(ReindexArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Minutes between cycles (default: from configuration)
    #[arg(short, long)]
    interval_mins: Option<u64>,

    /// Also write a daily rolling log file into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only this category (GS1, GS2, GS3 or GS4)
    #[arg(short = 'g', long)]
    category: Option<Category>,

    /// Page number, starting at 1
    #[arg(short, long, default_value = "1")]
    page: usize,

    /// Articles per page
    #[arg(long, default_value = "10")]
    per_page: usize,

    /// Include articles outside the recent window
    #[arg(short, long)]
    all: bool,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Search query
    #[arg(required = true)]
    query: String,

    /// Limit results
    #[arg(short, long, default_value = "10")]
    limit: usize,

    /// Only this category (GS1, GS2, GS3 or GS4)
    #[arg(short = 'g', long)]
    category: Option<Category>,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Args, Debug)]
struct ReindexArgs {
    /// Re-embed every stored article with the configured model first
    #[arg(short, long)]
    reembed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // If no command is provided, show help
        let _ = Cli::parse_from(["herald", "--help"]);
        return Ok(());
    };

    let log_dir = match &command {
        Commands::Watch(args) => args.log_dir.clone(),
        _ => None,
    };
    let _telemetry = telemetry::init_tracing_subscriber(log_dir.as_deref());

    let mut config = HeraldConfig::load(cli.config.as_deref()).await?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    let dimensions = config.processor.embedding.dimensions;
    let db = Database::new_from_path(&config.database.to_string_lossy(), dimensions).await?;

    // Listing only reads the store, so no embedding model is needed
    if let Commands::List(args) = command {
        return list_command(&config, &db, args).await;
    }

    match config.processor.embedding.provider {
        EmbeddingProvider::Local => {
            let model = FastEmbedModel::try_new(config.processor.embedding.cache_dir.as_deref())?;
            let pipeline = Pipeline::from_config(&config, model, db)?;
            dispatch(&config, &pipeline, command).await
        }
        EmbeddingProvider::Hashing => {
            let pipeline = Pipeline::from_config(&config, HashingEmbeddingModel::new(dimensions), db)?;
            dispatch(&config, &pipeline, command).await
        }
        EmbeddingProvider::Gemini => {
            let model = gemini_embedding_model(config.processor.embedding.requests_per_minute)?;
            let pipeline = Pipeline::from_config(&config, model, db)?;
            dispatch(&config, &pipeline, command).await
        }
    }
}

async fn dispatch<E>(config: &HeraldConfig, pipeline: &Pipeline<E>, command: Commands) -> anyhow::Result<()>
where
    E: EmbeddingModel + 'static,
{
    match command {
        Commands::Run(args) => run_command(pipeline, args).await,
        Commands::Watch(args) => watch_command(config, pipeline, args).await,
        Commands::Search(args) => search_command(pipeline, args).await,
        Commands::Reindex(args) => reindex_command(pipeline, args).await,
        Commands::List(args) => list_command(config, pipeline.database(), args).await,
    }
}

#[instrument(skip(pipeline))]
async fn run_command<E>(pipeline: &Pipeline<E>, args: RunArgs) -> anyhow::Result<()>
where
    E: EmbeddingModel + 'static,
{
    pipeline.rebuild_index().await?;
    let summary = pipeline.run_cycle().await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?),
        _ => print_summary(&summary),
    }
    Ok(())
}

#[instrument(skip(config, pipeline))]
async fn watch_command<E>(config: &HeraldConfig, pipeline: &Pipeline<E>, args: WatchArgs) -> anyhow::Result<()>
where
    E: EmbeddingModel + 'static,
{
    let minutes = args.interval_mins.unwrap_or(config.schedule.interval_mins).max(1);
    let indexed = pipeline.rebuild_index().await?;
    info!(indexed, interval_mins = minutes, "watch: starting");

    // The first tick fires immediately, giving the startup cycle
    let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("watch: shutting down");
                return Ok(());
            }
        }

        match pipeline.run_cycle().await {
            Ok(summary) => info!(new_articles = summary.inserted, "watch: cycle finished"),
            Err(IngestError::AlreadyRunning) => warn!("watch: previous cycle still running, skipping"),
            Err(e @ IngestError::Index(_)) => {
                error!(error = %e, "watch: vector index inconsistent, stopping");
                return Err(e.into());
            }
            Err(e) => error!(error = %e, "watch: cycle failed"),
        }
    }
}

#[instrument(skip(config, db))]
async fn list_command(config: &HeraldConfig, db: &Database, args: ListArgs) -> anyhow::Result<()> {
    let query = ArticleQuery {
        category: args.category,
        page: args.page,
        per_page: args.per_page,
        max_age: (!args.all).then(|| config.recent_window()),
    };
    let page = db.query(&query).await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&page_json(&page))?),
        _ => {
            println!(
                "Page {} of {} ({} articles)",
                page.current_page, page.total_pages, page.total_count
            );
            for article in &page.articles {
                println!(
                    "[{}] {} - {} ({})",
                    article.category,
                    article.title,
                    article.source,
                    article.date.format("%Y-%m-%d %H:%M")
                );
                println!("   {}", article.link);
                println!("   {}", article.summary);
                println!();
            }
        }
    }
    Ok(())
}

#[instrument(skip(pipeline))]
async fn search_command<E>(pipeline: &Pipeline<E>, args: SearchArgs) -> anyhow::Result<()>
where
    E: EmbeddingModel + 'static,
{
    pipeline.rebuild_index().await?;
    let options = SearchOptions {
        limit: args.limit,
        category: args.category,
    };
    let results = search_articles(pipeline, &args.query, &options).await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&results)?),
        _ => {
            println!("Found {} results", results.len());
            for (i, result) in results.iter().enumerate() {
                let article = &result.article;
                println!("{}. [{}] {} ({:.3})", i + 1, article.category, article.title, result.score);
                println!("   {} - {}", article.source, article.date.format("%Y-%m-%d"));
                println!("   URL: {}", article.link);
                println!();
            }
        }
    }
    Ok(())
}

#[instrument(skip(pipeline))]
async fn reindex_command<E>(pipeline: &Pipeline<E>, args: ReindexArgs) -> anyhow::Result<()>
where
    E: EmbeddingModel + 'static,
{
    if !args.reembed {
        let indexed = pipeline.rebuild_index().await?;
        println!("Rebuilt index with {} vectors", indexed);
        return Ok(());
    }

    let total = pipeline.database().count_articles().await?;
    println!("Reembedding {} articles...", total);

    let progress_bar = ProgressBar::new(total as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Reembedding articles...");

    let start_time = std::time::Instant::now();
    let (progress_sender, mut progress_receiver) = mpsc::channel(100);

    // Spawn a task to process progress updates
    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(id) = progress_receiver.recv().await {
                progress_bar.inc(1);
                progress_bar.set_message(format!("Processed {}", id));
            }
            progress_bar.finish_with_message("Reembedding completed");
        }
    });

    let reembedded = pipeline.reembed_all(Some(progress_sender)).await?;

    // Wait for progress task to complete (it will end when all senders are dropped)
    let _ = progress_handle.await;

    println!(
        "Reembedded {}/{} articles in {:.2?}",
        reembedded,
        total,
        start_time.elapsed()
    );
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("{} new articles", summary.inserted);
    println!(
        "  fetched {}, extracted {}, already known {}, failed {}, indexed {}",
        summary.fetched, summary.extracted, summary.duplicates, summary.failed, summary.indexed
    );
}

fn summary_json(summary: &RunSummary) -> serde_json::Value {
    serde_json::json!({
        "new_articles": summary.inserted,
        "fetched": summary.fetched,
        "extracted": summary.extracted,
        "duplicates": summary.duplicates,
        "failed": summary.failed,
        "existing": summary.existing,
        "rejected": summary.rejected,
        "indexed": summary.indexed,
    })
}

fn page_json(page: &ArticlePage) -> serde_json::Value {
    serde_json::json!({
        "articles": page.articles,
        "total_count": page.total_count,
        "total_pages": page.total_pages,
        "current_page": page.current_page,
    })
}
