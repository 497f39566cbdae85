//! # Article Classification
//!
//! Maps article text to exactly one `Category`. Two strategies share the
//! `Classifier` contract and are chosen once, when the pipeline is built:
//!
//! - `ModelClassifier` (see `sequence_model`): sequence classification inference
//! - `KeywordClassifier`: keyword counting, used when no model is available
//!
//! Callers never see which one is active, and neither strategy can fail:
//! inference errors degrade to the configured default category.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::article::Category;
use crate::processor::ClassifierConfig;
use crate::processor::sequence_model::ModelClassifier;

/// Text in, exactly one category out
pub trait Classifier: Send + Sync {
    /// Name of the strategy, for logs
    fn strategy(&self) -> &'static str;

    /// Classify a text. Total: always returns a category.
    fn classify(&self, text: &str) -> Category;
}

/// Heuristic classifier counting which category keywords appear in the
/// lower-cased text
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: BTreeMap<Category, Vec<String>>,
}

impl KeywordClassifier {
    pub fn new(keywords: BTreeMap<Category, Vec<String>>) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|(category, words)| {
                let words = words
                    .into_iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (category, words)
            })
            .collect();
        Self { keywords }
    }

    /// Number of distinct keywords present, per category in canonical order.
    /// Repeating a keyword does not raise the score.
    pub fn scores(&self, text: &str) -> [usize; 4] {
        let text = text.to_lowercase();
        let mut scores = [0usize; 4];
        for category in Category::ALL {
            if let Some(words) = self.keywords.get(&category) {
                scores[category.index()] = words.iter().filter(|w| text.contains(w.as_str())).count();
            }
        }
        scores
    }
}

impl Classifier for KeywordClassifier {
    fn strategy(&self) -> &'static str {
        "keyword"
    }

    fn classify(&self, text: &str) -> Category {
        let scores = self.scores(text);

        // Strictly greater only, so earlier categories win ties.
        let mut best = Category::ALL[0];
        for category in Category::ALL.into_iter().skip(1) {
            if scores[category.index()] > scores[best.index()] {
                best = category;
            }
        }
        best
    }
}

/// Pick the classification strategy for this process.
///
/// The model strategy is used when a model path is configured and the model
/// loads; otherwise the keyword strategy.
pub fn select_classifier(config: &ClassifierConfig) -> Box<dyn Classifier> {
    if let Some(path) = &config.model_path {
        match ModelClassifier::load(path, config.default_category) {
            Ok(model) => {
                info!(path = %path.display(), "classifier: using sequence classification model");
                return Box::new(model);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "classifier: model unavailable, falling back to keywords");
            }
        }
    } else {
        info!("classifier: no model configured, using keywords");
    }
    Box::new(KeywordClassifier::new(config.keywords.clone()))
}
