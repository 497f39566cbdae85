//! # Article Data Model
//!
//! The unit of ingestion and its content-derived identity.
//!
//! ## Key Components
//!
//! - `Article`: a fully processed news article ready to be persisted
//! - `ArticleId`: hex-encoded SHA-256 over (normalized title, source, publication time)
//! - `Category`: the closed set of four subject categories
//!
//! The `ArticleId` is the sole deduplication key of the pipeline. Identical
//! (title, source, timestamp) triples always produce the identical id, so
//! re-ingesting an unchanged feed never creates new records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Content-derived article identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    /// Compute the id of an article from its title, source label and publication time.
    ///
    /// Entries without a source-supplied publication time hash the empty string in
    /// place of the timestamp so their id stays stable across runs.
    pub fn compute(title: &str, source: &str, published: Option<DateTime<Utc>>) -> Self {
        let timestamp = published
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();

        // Each field is length-prefixed so field boundaries cannot shift
        let mut hasher = Sha256::new();
        for field in [normalize_title(title).as_str(), source, timestamp.as_str()] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap an id read back from storage
    pub fn from_stored(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a headline for identity and in-batch duplicate checks.
///
/// Leading and trailing whitespace is removed and internal whitespace runs
/// collapse to a single space. Case is preserved.
pub fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace separated words in a text
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Subject category of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "GS1")]
    Gs1,
    #[serde(rename = "GS2")]
    Gs2,
    #[serde(rename = "GS3")]
    Gs3,
    #[serde(rename = "GS4")]
    Gs4,
}

impl Category {
    /// All categories in canonical order. Ties between categories are always
    /// resolved in favour of the one appearing first here.
    pub const ALL: [Category; 4] = [Category::Gs1, Category::Gs2, Category::Gs3, Category::Gs4];

    pub fn code(&self) -> &'static str {
        match self {
            Category::Gs1 => "GS1",
            Category::Gs2 => "GS2",
            Category::Gs3 => "GS3",
            Category::Gs4 => "GS4",
        }
    }

    /// Human readable subject area
    pub fn label(&self) -> &'static str {
        match self {
            Category::Gs1 => "History, Culture & Society",
            Category::Gs2 => "Polity, Governance & International Relations",
            Category::Gs3 => "Economy, Technology & Environment",
            Category::Gs4 => "Ethics, Integrity & Aptitude",
        }
    }

    /// Position in the canonical ordering
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unknown category code
#[derive(Debug, Error)]
#[error("unknown category '{0}', expected one of GS1, GS2, GS3, GS4")]
pub struct ParseCategoryError(String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GS1" => Ok(Category::Gs1),
            "GS2" => Ok(Category::Gs2),
            "GS3" => Ok(Category::Gs3),
            "GS4" => Ok(Category::Gs4),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

/// A processed news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub link: String,
    /// Full extracted body text
    pub content: String,
    pub summary: String,
    /// Publication time, or the fetch time when the feed supplied none
    pub date: DateTime<Utc>,
    pub category: Category,
    /// Label of the feed the article came from
    pub source: String,
    /// When the article was last (re)ingested
    pub last_updated: DateTime<Utc>,
}
