//! # Extractive Summarization
//!
//! `TextRankSummarizer` ranks sentences with TextRank and keeps the best few in
//! their original order.
//!
//! ## Algorithm
//!
//! - Sentences are split at `.`, `!` or `?` followed by whitespace
//! - Edge weight between two sentences is the number of shared words divided
//!   by the sum of the logarithms of their lengths
//! - Scores come from power iteration with damping 0.85 until no score moves
//!   by more than 1e-4, or 100 rounds
//!
//! Short texts are returned untouched, and any ranking failure returns the
//! original text.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::article::word_count;
use crate::processor::SummarizerConfig;
use crate::processor::error::SummarizeError;

const DAMPING: f64 = 0.85;
const EPSILON: f64 = 1e-4;
const MAX_ITERATIONS: usize = 100;

/// Text in, condensed text out. Never fails.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct TextRankSummarizer {
    config: SummarizerConfig,
}

impl TextRankSummarizer {
    pub fn new(config: SummarizerConfig) -> Self {
        Self { config }
    }

    /// Rank and select sentences, surfacing failures
    pub fn try_summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Err(SummarizeError::NoSentences);
        }
        if sentences.len() <= self.config.max_sentences {
            return Ok(sentences.join(" "));
        }

        let words: Vec<HashSet<String>> = sentences.iter().map(|s| sentence_words(s)).collect();
        let lengths: Vec<usize> = sentences.iter().map(|s| word_count(s)).collect();
        let scores = text_rank(&words, &lengths)?;

        let mut ranked: Vec<usize> = (0..sentences.len()).collect();
        ranked.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]).then(a.cmp(b)));
        let mut keep: Vec<usize> = ranked.into_iter().take(self.config.max_sentences).collect();
        keep.sort_unstable();

        Ok(keep.into_iter().map(|i| sentences[i].as_str()).collect::<Vec<_>>().join(" "))
    }
}

impl Summarizer for TextRankSummarizer {
    fn summarize(&self, text: &str) -> String {
        if word_count(text) < self.config.min_words {
            return text.to_string();
        }
        match self.try_summarize(text) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "summarizer: falling back to original text");
                text.to_string()
            }
        }
    }
}

/// Split text into trimmed sentences
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = match chars.peek() {
                Some((_, next)) => next.is_whitespace(),
                None => true,
            };
            if at_boundary {
                let end = i + c.len_utf8();
                push_sentence(&mut sentences, &text[start..end]);
                start = end;
            }
        }
    }
    push_sentence(&mut sentences, &text[start..]);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let sentence = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

fn sentence_words(sentence: &str) -> HashSet<String> {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn similarity(a: &HashSet<String>, b: &HashSet<String>, len_a: usize, len_b: usize) -> f64 {
    let common = a.intersection(b).count();
    if common == 0 {
        return 0.0;
    }
    let norm = (len_a as f64).ln() + (len_b as f64).ln();
    if norm <= 0.0 { 0.0 } else { common as f64 / norm }
}

fn text_rank(words: &[HashSet<String>], lengths: &[usize]) -> Result<Vec<f64>, SummarizeError> {
    let n = words.len();
    let mut weights = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let w = similarity(&words[i], &words[j], lengths[i], lengths[j]);
            weights[i][j] = w;
            weights[j][i] = w;
        }
    }
    let out: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();

    let mut scores = vec![1.0 / n as f64; n];
    for round in 0..MAX_ITERATIONS {
        let mut next = vec![(1.0 - DAMPING) / n as f64; n];
        for (j, row) in weights.iter().enumerate() {
            if out[j] == 0.0 {
                continue;
            }
            for (i, w) in row.iter().enumerate() {
                next[i] += DAMPING * w / out[j] * scores[j];
            }
        }

        let delta = next
            .iter()
            .zip(&scores)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        scores = next;
        if delta < EPSILON {
            debug!(rounds = round + 1, "summarizer: converged");
            break;
        }
    }

    if scores.iter().any(|s| !s.is_finite()) {
        return Err(SummarizeError::Ranking("non-finite sentence score".to_string()));
    }
    Ok(scores)
}
