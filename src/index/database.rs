//! Database operations for the article store

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use libsql::{Connection, Row, Rows, Value, params};
use tracing::{debug, info, instrument, warn};

use crate::article::{Article, ArticleId, Category};
use crate::index::error::DbError;
use crate::index::schema::{self, VECTOR_INDEX};
use crate::index::{ArticlePage, ArticleQuery, StoredArticle, UpsertReport};
use crate::model::vec_to_blob;

const ARTICLE_COLUMNS: &str = "id, title, link, content, summary, date, category, source, last_updated";

/// Database manager for the article store
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    dimensions: usize,
}

impl Database {
    /// Create a new database manager storing `dimensions`-sized vectors
    #[instrument(skip(conn))]
    pub async fn new(conn: Connection, dimensions: usize) -> Result<Self, DbError> {
        schema::initialize_schema(&conn, dimensions).await?;
        Ok(Self { conn, dimensions })
    }

    /// Create a new database manager from a path
    pub async fn new_from_path(path: &str, dimensions: usize) -> Result<Self, DbError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::new(conn, dimensions).await
    }

    /// Dimension of the stored vectors
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Whether an article with this id is stored
    pub async fn exists(&self, id: &ArticleId) -> Result<bool, DbError> {
        let mut rows = self
            .conn
            .query("SELECT 1 FROM articles WHERE id = ?", params![id.as_str()])
            .await
            .map_err(|e| DbError::Query(format!("Failed to look up article: {}", e)))?;

        let row = rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to read lookup result: {}", e)))?;
        Ok(row.is_some())
    }

    /// Store a batch of articles and their embeddings in one transaction.
    ///
    /// Already-stored ids only get `last_updated` refreshed. A row refused by a
    /// table constraint, or whose embedding has the wrong dimension, is
    /// reported in `rejected` and the rest of the batch still commits. Any
    /// other failure rolls the whole batch back.
    #[instrument(skip(self, batch), fields(batch = batch.len()))]
    pub async fn upsert_many(&self, batch: &[StoredArticle]) -> Result<UpsertReport, DbError> {
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let mut report = UpsertReport::default();
        for stored in batch {
            let article = &stored.article;
            if stored.embedding.len() != self.dimensions {
                let reason = format!(
                    "embedding has dimension {}, store expects {}",
                    stored.embedding.len(),
                    self.dimensions
                );
                warn!(id = %article.id, %reason, "article rejected");
                report.rejected.push((article.id.clone(), reason));
                continue;
            }

            let inserted = tx
                .execute(
                    "INSERT INTO articles (id, title, link, content, summary, date, category, source, last_updated)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                     ON CONFLICT(id) DO NOTHING",
                    params![
                        article.id.as_str(),
                        article.title.as_str(),
                        article.link.as_str(),
                        article.content.as_str(),
                        article.summary.as_str(),
                        article.date.timestamp(),
                        article.category.code(),
                        article.source.as_str(),
                        article.last_updated.timestamp(),
                    ],
                )
                .await;

            let step = match inserted {
                Ok(0) => tx
                    .execute(
                        "UPDATE articles SET last_updated = ? WHERE id = ?",
                        params![article.last_updated.timestamp(), article.id.as_str()],
                    )
                    .await
                    .map(|_| report.existing.push(article.id.clone())),
                Ok(_) => store_embedding(&tx, &article.id, &stored.embedding)
                    .await
                    .map(|position| report.inserted.push((article.id.clone(), position))),
                Err(e) if is_constraint_violation(&e) => {
                    warn!(id = %article.id, error = %e, "article rejected by constraint");
                    report.rejected.push((article.id.clone(), e.to_string()));
                    Ok(())
                }
                Err(e) => Err(e),
            };

            if let Err(e) = step {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                return Err(DbError::Transaction(format!(
                    "Failed to store article {}: {}",
                    article.id, e
                )));
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        info!(
            inserted = report.inserted.len(),
            existing = report.existing.len(),
            rejected = report.rejected.len(),
            "articles persisted"
        );
        Ok(report)
    }

    /// One page of articles, newest first
    #[instrument(skip(self))]
    pub async fn query(&self, query: &ArticleQuery) -> Result<ArticlePage, DbError> {
        let per_page = query.per_page.max(1);
        let page = query.page.max(1);

        let mut conditions = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        if let Some(category) = query.category {
            conditions.push("category = ?");
            params.push(Value::Text(category.code().to_string()));
        }
        if let Some(max_age) = query.max_age {
            conditions.push("last_updated >= ?");
            params.push(Value::Integer((Utc::now() - max_age).timestamp()));
        }
        let filter = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let mut rows = self
            .conn
            .query(&format!("SELECT COUNT(*) FROM articles{filter}"), params.clone())
            .await
            .map_err(|e| DbError::Query(format!("Failed to count articles: {}", e)))?;
        let total_count = match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map_err(|e| DbError::Data(format!("Failed to get count: {}", e)))?
                as usize,
            Ok(None) => 0,
            Err(e) => return Err(DbError::Data(format!("Failed to get count: {}", e))),
        };

        let offset = (page - 1).saturating_mul(per_page).min(i64::MAX as usize);
        params.push(Value::Integer(per_page.min(i64::MAX as usize) as i64));
        params.push(Value::Integer(offset as i64));
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles{filter} ORDER BY date DESC, id ASC LIMIT ? OFFSET ?"
        );
        let rows = self
            .conn
            .query(&sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to query articles: {}", e)))?;
        let articles = collect_articles(rows).await?;

        debug!(total_count, page, returned = articles.len(), "article page");
        Ok(ArticlePage {
            articles,
            total_count,
            total_pages: total_count.div_ceil(per_page),
            current_page: page,
        })
    }

    /// Articles by id, in the order requested. Unknown ids are skipped.
    pub async fn get_articles(&self, ids: &[ArticleId]) -> Result<Vec<Article>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let params: Vec<Value> = ids.iter().map(|id| Value::Text(id.to_string())).collect();
        let rows = self
            .conn
            .query(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id IN ({placeholders})"),
                params,
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to get articles: {}", e)))?;

        let mut by_id: HashMap<ArticleId, Article> = collect_articles(rows)
            .await?
            .into_iter()
            .map(|article| (article.id.clone(), article))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Total number of stored articles
    pub async fn count_articles(&self) -> Result<usize, DbError> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM articles", params![])
            .await
            .map_err(|e| DbError::Query(format!("Failed to count articles: {}", e)))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row
                    .get(0)
                    .map_err(|e| DbError::Data(format!("Failed to get count: {}", e)))?;
                Ok(count as usize)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(DbError::Data(format!("Failed to get count: {}", e))),
        }
    }

    /// Number of stored vectors
    pub async fn vector_count(&self) -> Result<usize, DbError> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM embeddings", params![])
            .await
            .map_err(|e| DbError::Query(format!("Failed to count embeddings: {}", e)))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row
                .get::<i64>(0)
                .map_err(|e| DbError::Data(format!("Failed to get count: {}", e)))? as usize),
            Ok(None) => Ok(0),
            Err(e) => Err(DbError::Data(format!("Failed to get count: {}", e))),
        }
    }

    /// Position and article of every stored vector, in position order
    pub async fn load_positions(&self) -> Result<Vec<(u64, ArticleId)>, DbError> {
        let mut rows = self
            .conn
            .query("SELECT position, article_id FROM embeddings ORDER BY position", params![])
            .await
            .map_err(|e| DbError::Query(format!("Failed to load embeddings: {}", e)))?;

        let mut positions = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to read embedding: {}", e)))?
        {
            let position: i64 = row
                .get(0)
                .map_err(|e| DbError::Data(format!("Failed to get position: {}", e)))?;
            let id: String = row
                .get(1)
                .map_err(|e| DbError::Data(format!("Failed to get article_id: {}", e)))?;
            positions.push((position as u64, ArticleId::from_stored(id)));
        }
        Ok(positions)
    }

    /// The `k` stored vectors nearest to `query` by cosine similarity, as
    /// `(position, similarity)` pairs, best first; ties go to the lower
    /// position
    #[instrument(skip(self, query))]
    pub async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<(u64, f32)>, DbError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT e.position, vector_distance_cos(e.vector, ?1) AS distance
             FROM vector_top_k('{VECTOR_INDEX}', ?1, ?2) AS v
             JOIN embeddings e ON e.rowid = v.id
             ORDER BY distance ASC, e.position ASC"
        );
        let params = vec![
            Value::Blob(vec_to_blob(query)),
            Value::Integer(k.min(i64::MAX as usize) as i64),
        ];
        let mut rows = self
            .conn
            .query(&sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to run vector search: {}", e)))?;

        let mut ranked = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to read search result: {}", e)))?
        {
            let position: i64 = row
                .get(0)
                .map_err(|e| DbError::Data(format!("Failed to get position: {}", e)))?;
            let distance: f64 = row
                .get(1)
                .map_err(|e| DbError::Data(format!("Failed to get distance: {}", e)))?;
            ranked.push((position as u64, (1.0 - distance) as f32));
        }
        debug!(k, returned = ranked.len(), "vector search");
        Ok(ranked)
    }

    /// Id and body text of every stored article, in vector position order;
    /// articles without a stored vector come last
    pub async fn load_contents(&self) -> Result<Vec<(ArticleId, String)>, DbError> {
        let mut rows = self
            .conn
            .query(
                "SELECT a.id, a.content FROM articles a
                 LEFT JOIN embeddings e ON e.article_id = a.id
                 ORDER BY e.position IS NULL, e.position, a.rowid",
                params![],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to load contents: {}", e)))?;

        let mut contents = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to read content: {}", e)))?
        {
            let id: String = row
                .get(0)
                .map_err(|e| DbError::Data(format!("Failed to get id: {}", e)))?;
            let content: String = row
                .get(1)
                .map_err(|e| DbError::Data(format!("Failed to get content: {}", e)))?;
            contents.push((ArticleId::from_stored(id), content));
        }
        Ok(contents)
    }

    /// Replace the stored embedding of one article, keeping its position
    pub async fn update_embedding(&self, id: &ArticleId, embedding: &[f32]) -> Result<u64, DbError> {
        if embedding.len() != self.dimensions {
            return Err(DbError::Data(format!(
                "Embedding for {} has dimension {}, store expects {}",
                id,
                embedding.len(),
                self.dimensions
            )));
        }
        store_embedding(&self.conn, id, embedding)
            .await
            .map_err(|e| DbError::Query(format!("Failed to update embedding: {}", e)))
    }
}

/// Insert or replace one embedding and return its position
async fn store_embedding(conn: &Connection, id: &ArticleId, embedding: &[f32]) -> Result<u64, libsql::Error> {
    let mut rows = conn
        .query(
            "INSERT INTO embeddings (article_id, vector) VALUES (?, ?)
             ON CONFLICT(article_id) DO UPDATE SET vector = excluded.vector
             RETURNING position",
            params![id.as_str(), Value::Blob(vec_to_blob(embedding))],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get::<i64>(0)? as u64),
        None => Err(libsql::Error::QueryReturnedNoRows),
    }
}

async fn collect_articles(mut rows: Rows) -> Result<Vec<Article>, DbError> {
    let mut articles = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DbError::Data(format!("Failed to read article: {}", e)))?
    {
        articles.push(row_to_article(&row)?);
    }
    Ok(articles)
}

/// Convert a database row to an Article
fn row_to_article(row: &Row) -> Result<Article, DbError> {
    let id: String = row
        .get(0)
        .map_err(|e| DbError::Data(format!("Failed to get id: {}", e)))?;
    let category: String = row
        .get(6)
        .map_err(|e| DbError::Data(format!("Failed to get category: {}", e)))?;

    Ok(Article {
        id: ArticleId::from_stored(id),
        title: row
            .get(1)
            .map_err(|e| DbError::Data(format!("Failed to get title: {}", e)))?,
        link: row
            .get(2)
            .map_err(|e| DbError::Data(format!("Failed to get link: {}", e)))?,
        content: row
            .get(3)
            .map_err(|e| DbError::Data(format!("Failed to get content: {}", e)))?,
        summary: row
            .get(4)
            .map_err(|e| DbError::Data(format!("Failed to get summary: {}", e)))?,
        date: timestamp_column(row, 5, "date")?,
        category: category
            .parse::<Category>()
            .map_err(|e| DbError::Data(e.to_string()))?,
        source: row
            .get(7)
            .map_err(|e| DbError::Data(format!("Failed to get source: {}", e)))?,
        last_updated: timestamp_column(row, 8, "last_updated")?,
    })
}

fn timestamp_column(row: &Row, idx: i32, name: &str) -> Result<DateTime<Utc>, DbError> {
    let secs: i64 = row
        .get(idx)
        .map_err(|e| DbError::Data(format!("Failed to get {}: {}", name, e)))?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| DbError::Data(format!("Invalid {} timestamp: {}", name, secs)))
}

/// SQLite result codes share the low byte; 19 is SQLITE_CONSTRAINT
fn is_constraint_violation(err: &libsql::Error) -> bool {
    match err {
        libsql::Error::SqliteFailure(code, _) => code & 0xff == 19,
        other => other.to_string().contains("constraint failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    async fn setup_test_db() -> Result<(Database, tempfile::TempDir), DbError> {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();

        let db = Database::new_from_path(&db_path, 3).await?;
        Ok((db, temp_dir))
    }

    fn stored(n: usize, category: Category) -> StoredArticle {
        let date = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::hours(n as i64);
        let title = format!("Headline number {n}");
        StoredArticle {
            article: Article {
                id: ArticleId::compute(&title, "Test Wire", Some(date)),
                title,
                link: format!("https://news.example.com/{n}"),
                content: format!("Body text of article {n}"),
                summary: format!("Summary {n}"),
                date,
                category,
                source: "Test Wire".to_string(),
                last_updated: Utc::now(),
            },
            embedding: vec![n as f32, 1.0, 0.5],
        }
    }

    fn with_embedding(mut stored: StoredArticle, embedding: [f32; 3]) -> StoredArticle {
        stored.embedding = embedding.to_vec();
        stored
    }

    #[tokio::test]
    async fn test_database_initialization() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let mut result = db
            .conn
            .query(
                "SELECT name FROM sqlite_master WHERE name IN ('articles', 'embeddings', 'embeddings_idx')",
                params![],
            )
            .await
            .unwrap();

        let mut names = Vec::new();
        while let Ok(Some(row)) = result.next().await {
            let name: String = row.get(0).unwrap();
            names.push(name);
        }

        assert_eq!(names.len(), 3);
        assert!(names.contains(&"articles".to_string()));
        assert!(names.contains(&"embeddings".to_string()));
        assert!(names.contains(&"embeddings_idx".to_string()));
        assert_eq!(db.dimensions(), 3);
    }

    #[tokio::test]
    async fn test_upsert_and_read_back() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let a = stored(1, Category::Gs3);
        let b = stored(2, Category::Gs1);

        let report = db.upsert_many(&[a.clone(), b.clone()]).await.unwrap();
        let ids: Vec<_> = report.inserted.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(ids, vec![a.article.id.clone(), b.article.id.clone()]);
        assert!(report.inserted[0].1 < report.inserted[1].1);
        assert!(report.existing.is_empty());
        assert!(db.exists(&a.article.id).await.unwrap());
        assert!(!db.exists(&ArticleId::from_stored("missing")).await.unwrap());

        let articles = db.get_articles(&[b.article.id.clone(), a.article.id.clone()]).await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].id, b.article.id);
        assert_eq!(articles[1].category, Category::Gs3);
        assert_eq!(articles[1].date, a.article.date);

        let positions = db.load_positions().await.unwrap();
        assert_eq!(positions, report.inserted.iter().map(|(id, p)| (*p, id.clone())).collect::<Vec<_>>());
        assert_eq!(db.vector_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reoffered_article_only_refreshes_last_updated() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let mut a = stored(1, Category::Gs2);
        a.article.last_updated = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        db.upsert_many(std::slice::from_ref(&a)).await.unwrap();

        let mut again = a.clone();
        again.article.summary = "changed".to_string();
        again.article.last_updated = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let report = db.upsert_many(&[again.clone()]).await.unwrap();

        assert!(report.inserted.is_empty());
        assert_eq!(report.existing, vec![a.article.id.clone()]);
        assert_eq!(db.count_articles().await.unwrap(), 1);
        assert_eq!(db.vector_count().await.unwrap(), 1);

        let stored = db.get_articles(&[a.article.id.clone()]).await.unwrap().remove(0);
        assert_eq!(stored.summary, a.article.summary);
        assert_eq!(stored.last_updated, again.article.last_updated);
    }

    #[tokio::test]
    async fn test_constraint_violation_rejects_only_that_row() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let good = stored(1, Category::Gs1);
        let mut bad = stored(2, Category::Gs1);
        bad.article.content = String::new();
        let mut wrong_size = stored(3, Category::Gs2);
        wrong_size.embedding = vec![1.0, 0.0];
        let also_good = stored(4, Category::Gs4);

        let report = db
            .upsert_many(&[good.clone(), bad.clone(), wrong_size.clone(), also_good.clone()])
            .await
            .unwrap();

        assert_eq!(report.inserted.len(), 2);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].0, bad.article.id);
        assert_eq!(report.rejected[1].0, wrong_size.article.id);
        assert_eq!(db.count_articles().await.unwrap(), 2);
        assert_eq!(db.vector_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_pagination() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let batch: Vec<_> = (0..25).map(|n| stored(n, Category::Gs2)).collect();
        db.upsert_many(&batch).await.unwrap();

        let page = db
            .query(&ArticleQuery {
                page: 3,
                per_page: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.articles.len(), 5);
        assert_eq!(page.total_count, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);

        let first = db.query(&ArticleQuery::default()).await.unwrap();
        // Newest first
        assert_eq!(first.articles[0].id, batch[24].article.id);
        assert!(first.articles.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[tokio::test]
    async fn test_huge_page_number_is_an_empty_page() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.upsert_many(&[stored(1, Category::Gs2)]).await.unwrap();

        let page = db
            .query(&ArticleQuery {
                page: usize::MAX,
                per_page: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(page.articles.is_empty());
        assert_eq!(page.total_count, 1);
        assert_eq!(page.current_page, usize::MAX);
    }

    #[tokio::test]
    async fn test_query_filters() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let mut old = stored(0, Category::Gs1);
        old.article.last_updated = Utc::now() - Duration::days(10);
        let fresh = stored(1, Category::Gs1);
        let other = stored(2, Category::Gs4);
        db.upsert_many(&[old, fresh.clone(), other]).await.unwrap();

        let gs1 = db
            .query(&ArticleQuery {
                category: Some(Category::Gs1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(gs1.total_count, 2);

        let recent_gs1 = db
            .query(&ArticleQuery {
                category: Some(Category::Gs1),
                max_age: Some(Duration::days(3)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(recent_gs1.total_count, 1);
        assert_eq!(recent_gs1.articles[0].id, fresh.article.id);

        let empty = db
            .query(&ArticleQuery {
                category: Some(Category::Gs3),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(empty.total_pages, 0);
        assert!(empty.articles.is_empty());
    }

    #[tokio::test]
    async fn test_nearest_ranks_by_cosine_similarity() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let batch = vec![
            with_embedding(stored(0, Category::Gs1), [0.0, 1.0, 0.0]),
            with_embedding(stored(1, Category::Gs1), [1.0, 0.0, 0.0]),
            with_embedding(stored(2, Category::Gs1), [0.6, 0.8, 0.0]),
        ];
        let report = db.upsert_many(&batch).await.unwrap();
        let position = |n: usize| report.inserted[n].1;

        let ranked = db.nearest(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, position(1));
        assert!((ranked[0].1 - 1.0).abs() < 1e-4);
        assert_eq!(ranked[1].0, position(2));
        assert!((ranked[1].1 - 0.6).abs() < 1e-4);

        assert!(db.nearest(&[1.0, 0.0, 0.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_embedding_keeps_position() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let a = with_embedding(stored(1, Category::Gs3), [1.0, 0.0, 0.0]);
        let report = db.upsert_many(std::slice::from_ref(&a)).await.unwrap();
        let position = report.inserted[0].1;

        assert_eq!(db.update_embedding(&a.article.id, &[0.0, 0.0, 1.0]).await.unwrap(), position);
        assert_eq!(db.vector_count().await.unwrap(), 1);
        let ranked = db.nearest(&[0.0, 0.0, 1.0], 1).await.unwrap();
        assert_eq!(ranked[0].0, position);
        assert!((ranked[0].1 - 1.0).abs() < 1e-4);

        assert!(matches!(
            db.update_embedding(&a.article.id, &[1.0]).await,
            Err(DbError::Data(_))
        ));

        let contents = db.load_contents().await.unwrap();
        assert_eq!(contents, vec![(a.article.id, a.article.content)]);
    }

    #[tokio::test]
    async fn test_dimension_change_drops_stored_vectors() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("test.db").to_string_lossy().to_string();
        {
            let db = Database::new_from_path(&path, 3).await.unwrap();
            db.upsert_many(&[stored(1, Category::Gs1)]).await.unwrap();
        }

        let reopened = Database::new_from_path(&path, 4).await.unwrap();
        assert_eq!(reopened.count_articles().await.unwrap(), 1);
        assert_eq!(reopened.vector_count().await.unwrap(), 0);
        assert_eq!(reopened.load_contents().await.unwrap().len(), 1);
    }
}
