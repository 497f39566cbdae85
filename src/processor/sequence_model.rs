//! # Sequence Classification Model
//!
//! A model-backed `Classifier`. The model file is JSON produced by the offline
//! training job and holds:
//!
//! - `labels`: category of each output row
//! - `max_length`: fixed input length; longer inputs are truncated, shorter padded
//! - `vocab`: token → id, including the `[PAD]` and `[UNK]` tokens
//! - `weights`: one row per label, one weight per vocabulary id
//! - `bias`: one value per label
//!
//! Inference masks out padding, averages the weights of the remaining tokens
//! per label, adds the bias and picks the label with the largest logit.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, trace};

use crate::article::Category;
use crate::processor::classifier::Classifier;
use crate::processor::error::{ClassifyError, ProcessError};

pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";

/// On-disk model layout
#[derive(Debug, Clone, Deserialize)]
pub struct ModelFile {
    pub labels: Vec<Category>,
    pub max_length: usize,
    pub vocab: HashMap<String, u32>,
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

/// Model input after tokenization, always exactly `max_length` long
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedInput {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u8>,
}

/// Word-level tokenizer backed by the model vocabulary
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: HashMap<String, u32>,
    pad_id: u32,
    unk_id: u32,
    max_length: usize,
}

impl Tokenizer {
    pub fn new(vocab: HashMap<String, u32>, max_length: usize) -> Result<Self, ProcessError> {
        let pad_id = *vocab
            .get(PAD_TOKEN)
            .ok_or_else(|| ProcessError::ModelLoad(format!("vocabulary has no {PAD_TOKEN} token")))?;
        let unk_id = *vocab
            .get(UNK_TOKEN)
            .ok_or_else(|| ProcessError::ModelLoad(format!("vocabulary has no {UNK_TOKEN} token")))?;
        if max_length == 0 {
            return Err(ProcessError::ModelLoad("max_length must be positive".to_string()));
        }
        Ok(Self {
            vocab,
            pad_id,
            unk_id,
            max_length,
        })
    }

    /// Lower-case, split on non-alphanumeric characters, map to ids, then
    /// truncate or pad to `max_length`.
    pub fn encode(&self, text: &str) -> TokenizedInput {
        let mut input_ids: Vec<u32> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .take(self.max_length)
            .map(|w| {
                let w = w.to_lowercase();
                self.vocab.get(&w).copied().unwrap_or(self.unk_id)
            })
            .collect();

        let mut attention_mask = vec![1u8; input_ids.len()];
        input_ids.resize(self.max_length, self.pad_id);
        attention_mask.resize(self.max_length, 0);

        TokenizedInput {
            input_ids,
            attention_mask,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }
}

/// Classifier running a linear sequence classification head
#[derive(Debug, Clone)]
pub struct ModelClassifier {
    tokenizer: Tokenizer,
    labels: Vec<Category>,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    default_category: Category,
}

impl ModelClassifier {
    /// Load and validate a model file
    pub fn load(path: impl AsRef<Path>, default_category: Category) -> Result<Self, ProcessError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ProcessError::ModelLoad(format!("failed to read {}: {}", path.display(), e)))?;
        let model: ModelFile = serde_json::from_str(&raw)
            .map_err(|e| ProcessError::ModelLoad(format!("failed to parse {}: {}", path.display(), e)))?;
        Self::from_model(model, default_category)
    }

    pub fn from_model(model: ModelFile, default_category: Category) -> Result<Self, ProcessError> {
        if model.labels.is_empty() {
            return Err(ProcessError::ModelLoad("model has no labels".to_string()));
        }
        if model.weights.len() != model.labels.len() || model.bias.len() != model.labels.len() {
            return Err(ProcessError::ModelLoad(format!(
                "expected {} weight rows and biases, found {} and {}",
                model.labels.len(),
                model.weights.len(),
                model.bias.len()
            )));
        }

        let tokenizer = Tokenizer::new(model.vocab, model.max_length)?;
        if let Some(id) = tokenizer.vocab.values().find(|id| **id as usize >= tokenizer.vocab_size()) {
            return Err(ProcessError::ModelLoad(format!("token id {id} outside vocabulary")));
        }

        Ok(Self {
            tokenizer,
            labels: model.labels,
            weights: model.weights,
            bias: model.bias,
            default_category,
        })
    }

    /// Raw logits for a tokenized input, one per label
    pub fn logits(&self, input: &TokenizedInput) -> Result<Vec<f32>, ClassifyError> {
        let active: Vec<usize> = input
            .input_ids
            .iter()
            .zip(&input.attention_mask)
            .filter(|(_, mask)| **mask == 1)
            .map(|(id, _)| *id as usize)
            .collect();
        if active.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }

        let mut logits = Vec::with_capacity(self.labels.len());
        for (row, label) in self.weights.iter().zip(&self.labels) {
            let mut sum = 0.0f32;
            for id in &active {
                sum += row.get(*id).copied().ok_or_else(|| {
                    ClassifyError::Shape(format!("row for {label} has {} weights, token id {id}", row.len()))
                })?;
            }
            let logit = self.bias[logits.len()] + sum / active.len() as f32;
            if !logit.is_finite() {
                return Err(ClassifyError::NonFinite(label.to_string()));
            }
            logits.push(logit);
        }
        Ok(logits)
    }

    /// Classify, surfacing inference failures
    pub fn try_classify(&self, text: &str) -> Result<Category, ClassifyError> {
        let input = self.tokenizer.encode(text);
        let logits = self.logits(&input)?;
        trace!(?logits, "classifier: logits");

        // Strictly greater only, so the lowest index wins exact ties.
        let mut best = 0;
        for (i, logit) in logits.iter().enumerate().skip(1) {
            if *logit > logits[best] {
                best = i;
            }
        }
        Ok(self.labels[best])
    }
}

impl Classifier for ModelClassifier {
    fn strategy(&self) -> &'static str {
        "model"
    }

    fn classify(&self, text: &str) -> Category {
        match self.try_classify(text) {
            Ok(category) => category,
            Err(e) => {
                error!(error = %e, default = %self.default_category, "classifier: inference failed");
                self.default_category
            }
        }
    }
}
