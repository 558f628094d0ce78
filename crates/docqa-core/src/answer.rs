//! Extractive answering.
//!
//! An [`AnswerExtractor`] selects a literal span of the retrieved context
//! that answers the question; it never generates text. An empty
//! [`Answer`] means "not found". Model-backed extractors live in the
//! application crate; [`LexicalExtractor`] is the built-in, model-free
//! implementation.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Answer;
use crate::text::{content_words, sentence_spans, stem};

/// Trait for extractive question-answering backends.
#[async_trait]
pub trait AnswerExtractor: Send + Sync {
    /// Short backend identifier, used in logs.
    fn name(&self) -> &str;

    /// Extract an answer span from `context`.
    ///
    /// Low-confidence results must be returned as [`Answer::empty`], not
    /// as errors. Errors are reserved for backend failures.
    async fn extract(&self, question: &str, context: &str) -> Result<Answer>;
}

/// Default minimum fraction of question terms a sentence must contain.
pub const DEFAULT_LEXICAL_MIN_SCORE: f32 = 0.25;

/// Sentence-selection extractor.
///
/// Splits the context into sentences and scores each by the fraction of
/// the question's content words (stop-words removed, light suffix
/// stemming) that it contains. The best sentence, earliest on ties, is
/// returned verbatim when its score reaches `min_score`.
#[derive(Debug, Clone)]
pub struct LexicalExtractor {
    min_score: f32,
}

impl LexicalExtractor {
    pub fn new(min_score: f32) -> Self {
        Self {
            min_score: min_score.clamp(0.0, 1.0),
        }
    }
}

impl Default for LexicalExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_LEXICAL_MIN_SCORE)
    }
}

fn term_set(text: &str) -> HashSet<String> {
    content_words(text).map(|w| stem(&w).to_string()).collect()
}

#[async_trait]
impl AnswerExtractor for LexicalExtractor {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn extract(&self, question: &str, context: &str) -> Result<Answer> {
        let wanted = term_set(question);
        if wanted.is_empty() {
            return Ok(Answer::empty());
        }

        let mut best: Option<(usize, usize, usize)> = None;
        for (start, end) in sentence_spans(context) {
            let found = term_set(&context[start..end]);
            let matched = wanted.intersection(&found).count();
            if matched > best.map(|(m, _, _)| m).unwrap_or(0) {
                best = Some((matched, start, end));
            }
        }

        let Some((matched, start, end)) = best else {
            return Ok(Answer::empty());
        };
        let score = matched as f32 / wanted.len() as f32;
        if score < self.min_score {
            return Ok(Answer::empty());
        }
        Ok(Answer::from_span(context, start, end, score))
    }
}
