//! # Database Schema Module
//!
//! Creates the article store's tables and indexes.
//!
//! ## Schema Design
//!
//! 1. `articles` - One row per article, keyed by its content id. Dates are
//!    unix seconds; `category` is constrained to the four category codes.
//! 2. `embeddings` - The normalized embedding of each article as an
//!    `F32_BLOB(d)`. `position` is an autoincrement row id, so positions are
//!    append-only and never reused.
//! 3. `embeddings_idx` - libsql vector index (cosine) over `embeddings.vector`,
//!    queried with `vector_top_k`.
//!
//! The vector column is typed with the configured dimension. Opening a store
//! whose vectors have another dimension drops the stored vectors; articles
//! are kept and can be re-embedded.
//!
//! The schema version is tracked in `PRAGMA user_version`.

use crate::index::error::DbError;
use libsql::{Connection, params};
use tracing::{debug, warn};

pub const SCHEMA_VERSION: i64 = 2;

/// Name of the libsql vector index, as passed to `vector_top_k`
pub const VECTOR_INDEX: &str = "embeddings_idx";

/// Initialize the database schema for `dimensions`-sized vectors
pub async fn initialize_schema(conn: &Connection, dimensions: usize) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS articles (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            link TEXT NOT NULL,
            content TEXT NOT NULL CHECK (length(content) > 0),
            summary TEXT NOT NULL,
            date INTEGER NOT NULL,
            category TEXT NOT NULL CHECK (category IN ('GS1', 'GS2', 'GS3', 'GS4')),
            source TEXT NOT NULL,
            last_updated INTEGER NOT NULL
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create articles table: {}", e)))?;

    let vector_type = format!("F32_BLOB({dimensions})");
    if let Some(existing) = embeddings_definition(conn).await? {
        if !existing.contains(&vector_type) {
            warn!(
                dimensions,
                "stored embeddings have another dimension; dropping them, run `herald reindex --reembed`"
            );
            conn.execute(&format!("DROP INDEX IF EXISTS {VECTOR_INDEX}"), params![])
                .await
                .map_err(|e| DbError::Schema(format!("Failed to drop vector index: {}", e)))?;
            conn.execute("DROP TABLE embeddings", params![])
                .await
                .map_err(|e| DbError::Schema(format!("Failed to drop embeddings table: {}", e)))?;
        }
    }

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS embeddings (
                position INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id TEXT NOT NULL UNIQUE,
                vector {vector_type} NOT NULL,
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
            )"
        ),
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create embeddings table: {}", e)))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category)",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create index on category: {}", e)))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_articles_date ON articles(date)",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create index on date: {}", e)))?;

    conn.execute(
        &format!(
            "CREATE INDEX IF NOT EXISTS {VECTOR_INDEX} ON embeddings (libsql_vector_idx(vector, 'metric=cosine'))"
        ),
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create vector index: {}", e)))?;

    conn.execute(&format!("PRAGMA user_version = {SCHEMA_VERSION}"), params![])
        .await
        .map_err(|e| DbError::Schema(format!("Failed to set schema version: {}", e)))?;

    debug!(version = SCHEMA_VERSION, dimensions, "schema initialized");
    Ok(())
}

/// `CREATE TABLE` statement of the embeddings table, if it exists
async fn embeddings_definition(conn: &Connection) -> Result<Option<String>, DbError> {
    let mut rows = conn
        .query(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'embeddings'",
            params![],
        )
        .await
        .map_err(|e| DbError::Schema(format!("Failed to read schema: {}", e)))?;

    match rows.next().await {
        Ok(Some(row)) => Ok(Some(
            row.get::<String>(0)
                .map_err(|e| DbError::Schema(format!("Failed to read schema: {}", e)))?,
        )),
        Ok(None) => Ok(None),
        Err(e) => Err(DbError::Schema(format!("Failed to read schema: {}", e))),
    }
}
