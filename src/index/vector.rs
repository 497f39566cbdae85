//! Position map over the stored vectors.
//!
//! The vectors themselves live in the `embeddings` table behind libsql's
//! vector index; `Database::nearest` ranks them there. `VectorIndex` keeps the
//! position → article map that turns ranked positions back into articles.
//! Positions are the table's append-only row ids, so they only ever grow.
//! Both directions of the map are kept in lockstep, and the map is compared
//! against the stored vector count; any disagreement is reported as
//! `IndexError::Inconsistent`.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, error};

use crate::article::ArticleId;
use crate::index::error::IndexError;

/// Scale a vector to unit length. `None` for zero or non-finite vectors.
pub fn l2_normalize(vec: &[f32]) -> Option<Vec<f32>> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(vec.iter().map(|x| x / norm).collect())
}

/// Outcome of an insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The article was recorded at `position`
    Inserted { position: u64 },
    /// The article was already indexed at `position`; nothing changed
    AlreadyIndexed { position: u64 },
}

impl Insertion {
    pub fn position(&self) -> u64 {
        match self {
            Insertion::Inserted { position } | Insertion::AlreadyIndexed { position } => *position,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Insertion::Inserted { .. })
    }
}

/// One search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub article_id: ArticleId,
    pub position: u64,
    pub score: f32,
}

#[derive(Debug, Default)]
struct Entries {
    by_position: BTreeMap<u64, ArticleId>,
    by_article: HashMap<ArticleId, u64>,
}

#[derive(Debug)]
pub struct VectorIndex {
    dimensions: usize,
    entries: Option<Entries>,
}

impl VectorIndex {
    /// An uninitialized index for `dimensions`-sized vectors
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: None,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn is_ready(&self) -> bool {
        self.entries.is_some()
    }

    /// Build the position map if there is none yet
    pub fn ensure_ready(&mut self) {
        if self.entries.is_none() {
            debug!(dimensions = self.dimensions, "vector index: building position map");
            self.reset();
        }
    }

    /// Replace the position map with an empty one, dropping every entry
    pub fn reset(&mut self) {
        self.entries = Some(Entries::default());
    }

    /// Number of indexed vectors
    pub fn len(&self) -> usize {
        self.entries.as_ref().map(|e| e.by_position.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Article whose vector is stored at `position`
    pub fn resolve(&self, position: u64) -> Option<&ArticleId> {
        self.entries.as_ref()?.by_position.get(&position)
    }

    pub fn position_of(&self, article_id: &ArticleId) -> Option<u64> {
        self.entries.as_ref()?.by_article.get(article_id).copied()
    }

    /// Verify the stored vector count and both directions of the map agree
    pub fn check_consistency(&self, stored_vectors: usize) -> Result<(), IndexError> {
        let entries = self.len();
        let reverse = self.entries.as_ref().map(|e| e.by_article.len()).unwrap_or(0);
        if stored_vectors != entries || reverse != entries {
            error!(vectors = stored_vectors, entries, reverse, "vector index: inconsistent");
            return Err(IndexError::Inconsistent {
                vectors: stored_vectors,
                entries,
            });
        }
        Ok(())
    }

    /// Record that the vector of `article_id` is stored at `position`
    pub fn insert(&mut self, article_id: ArticleId, position: u64) -> Result<Insertion, IndexError> {
        let entries = self.entries.get_or_insert_with(Entries::default);

        if let Some(&existing) = entries.by_article.get(&article_id) {
            return Ok(Insertion::AlreadyIndexed { position: existing });
        }
        if let Some((&last, _)) = entries.by_position.last_key_value() {
            if position <= last {
                error!(position, last, "vector index: position out of order");
                return Err(IndexError::OutOfOrder { position, last });
            }
        }

        entries.by_position.insert(position, article_id.clone());
        entries.by_article.insert(article_id, position);

        let forward = entries.by_position.len();
        if entries.by_article.len() != forward {
            error!(forward, reverse = entries.by_article.len(), "vector index: inconsistent");
            return Err(IndexError::Inconsistent {
                vectors: forward,
                entries: entries.by_article.len(),
            });
        }
        Ok(Insertion::Inserted { position })
    }

    /// Validate and normalize a query vector
    pub fn prepare_query(&self, query: &[f32]) -> Result<Vec<f32>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        l2_normalize(query).ok_or(IndexError::InvalidVector)
    }

    /// Turn ranked `(position, score)` pairs into hits. Positions the map
    /// does not know yet are skipped.
    pub fn resolve_hits(&self, ranked: impl IntoIterator<Item = (u64, f32)>) -> Vec<SearchHit> {
        ranked
            .into_iter()
            .filter_map(|(position, score)| {
                self.resolve(position).map(|article_id| SearchHit {
                    article_id: article_id.clone(),
                    position,
                    score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> ArticleId {
        ArticleId::from_stored(format!("article-{n}"))
    }

    #[test]
    fn test_starts_uninitialized() {
        let mut index = VectorIndex::new(3);
        assert!(!index.is_ready());
        assert_eq!(index.len(), 0);
        assert_eq!(index.resolve(1), None);

        index.ensure_ready();
        assert!(index.is_ready());
    }

    #[test]
    fn test_positions_resolve_to_their_articles() {
        let mut index = VectorIndex::new(3);
        for n in 1..=5 {
            let insertion = index.insert(id(n), n as u64 * 2).unwrap();
            assert_eq!(insertion, Insertion::Inserted { position: n as u64 * 2 });
        }
        assert_eq!(index.len(), 5);
        for n in 1..=5 {
            assert_eq!(index.resolve(n as u64 * 2), Some(&id(n)));
            assert_eq!(index.position_of(&id(n)), Some(n as u64 * 2));
        }
        index.check_consistency(5).unwrap();
    }

    #[test]
    fn test_reinsert_is_noop() {
        let mut index = VectorIndex::new(2);
        index.insert(id(0), 1).unwrap();
        index.insert(id(1), 2).unwrap();

        let again = index.insert(id(0), 3).unwrap();
        assert_eq!(again, Insertion::AlreadyIndexed { position: 1 });
        assert!(!again.is_new());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_positions_only_grow() {
        let mut index = VectorIndex::new(2);
        index.insert(id(0), 5).unwrap();
        assert!(matches!(
            index.insert(id(1), 5),
            Err(IndexError::OutOfOrder { position: 5, last: 5 })
        ));
        assert!(matches!(index.insert(id(1), 3), Err(IndexError::OutOfOrder { .. })));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_reset_clears_metadata() {
        let mut index = VectorIndex::new(2);
        index.insert(id(0), 7).unwrap();
        index.reset();

        assert!(index.is_ready());
        assert_eq!(index.len(), 0);
        assert_eq!(index.resolve(7), None);
        assert_eq!(index.position_of(&id(0)), None);

        // A reset map accepts any position again
        assert_eq!(index.insert(id(1), 1).unwrap().position(), 1);
        assert_eq!(index.resolve(1), Some(&id(1)));
    }

    #[test]
    fn test_inconsistency_is_detected() {
        let mut index = VectorIndex::new(2);
        index.insert(id(0), 1).unwrap();
        index.insert(id(1), 2).unwrap();

        assert!(matches!(
            index.check_consistency(3),
            Err(IndexError::Inconsistent { vectors: 3, entries: 2 })
        ));

        if let Some(entries) = index.entries.as_mut() {
            entries.by_article.insert(id(99), 99);
        }
        assert!(matches!(
            index.insert(id(2), 3),
            Err(IndexError::Inconsistent { vectors: 3, entries: 4 })
        ));
    }

    #[test]
    fn test_resolve_hits_skips_unknown_positions() {
        let mut index = VectorIndex::new(2);
        index.insert(id(0), 1).unwrap();
        index.insert(id(1), 2).unwrap();

        let hits = index.resolve_hits(vec![(2, 0.9), (8, 0.5), (1, 0.1)]);
        let ids: Vec<_> = hits.iter().map(|h| h.article_id.clone()).collect();
        assert_eq!(ids, vec![id(1), id(0)]);
        assert_eq!(hits[0].position, 2);
    }

    #[test]
    fn test_prepare_query() {
        let index = VectorIndex::new(3);
        let query = index.prepare_query(&[0.0, 3.0, 4.0]).unwrap();
        assert!((query[1] - 0.6).abs() < 1e-6);
        assert!(matches!(
            index.prepare_query(&[1.0, 0.0]),
            Err(IndexError::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert!(matches!(index.prepare_query(&[0.0; 3]), Err(IndexError::InvalidVector)));
    }

    #[test]
    fn test_l2_normalize() {
        let v = l2_normalize(&[3.0, 4.0]).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!(l2_normalize(&[0.0, 0.0]).is_none());
        assert!(l2_normalize(&[f32::NAN, 1.0]).is_none());
    }
}
