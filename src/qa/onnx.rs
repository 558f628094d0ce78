//! Extractive QA with a DistilBERT SQuAD model on tract.
//!
//! The question/context pair is tokenized with sliding windows over the
//! context (384 tokens, stride 128). For every window the start and end
//! logits are softmaxed over context tokens only, and the best span with
//! `end >= start` and at most `max_answer_tokens` tokens wins. The span
//! score is `p(start) * p(end)`; the best span across all windows is
//! mapped back to byte offsets in the context.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};
use tract_onnx::prelude::*;
use tracing::{debug, info};

use docqa_core::answer::AnswerExtractor;
use docqa_core::models::Answer;

use crate::config::AnswerConfig;
use crate::model_cache::ensure_cached;

const DEFAULT_QA_REPO: &str = "Xenova/distilbert-base-cased-distilled-squad";
const ONNX_FILE: &str = "onnx/model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";
const MAX_SEQ_LEN: usize = 384;
const DOC_STRIDE: usize = 128;

struct Loaded {
    tokenizer: Tokenizer,
    model: TypedRunnableModel<TypedModel>,
}

pub struct OnnxQaExtractor {
    loaded: Arc<Loaded>,
    min_score: f32,
    max_answer_tokens: usize,
}

impl OnnxQaExtractor {
    pub fn new(config: &AnswerConfig) -> Result<Self> {
        let repo = config.model.as_deref().unwrap_or(DEFAULT_QA_REPO);
        let cache_name = repo.replace('/', "--");
        let (onnx_path, tokenizer_path) =
            ensure_cached(&cache_name, repo, ONNX_FILE, TOKENIZER_FILE)?;

        let mut tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| anyhow!("Load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                strategy: TruncationStrategy::OnlySecond,
                stride: DOC_STRIDE,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Configure truncation: {}", e))?;
        tokenizer.with_padding(None);

        let model = tract_onnx::onnx()
            .model_for_path(onnx_path)
            .map_err(|e| anyhow!("Load ONNX: {}", e))?
            .into_optimized()
            .map_err(|e| anyhow!("Optimize: {}", e))?
            .into_runnable()
            .map_err(|e| anyhow!("Build tract runnable: {}", e))?;
        info!(model = %repo, "loaded QA model");

        Ok(Self {
            loaded: Arc::new(Loaded { tokenizer, model }),
            min_score: config.min_score,
            max_answer_tokens: config.max_answer_tokens,
        })
    }
}

#[async_trait]
impl AnswerExtractor for OnnxQaExtractor {
    fn name(&self) -> &str {
        "onnx"
    }

    async fn extract(&self, question: &str, context: &str) -> Result<Answer> {
        if question.trim().is_empty() || context.trim().is_empty() {
            return Ok(Answer::empty());
        }

        let loaded = self.loaded.clone();
        let max_answer_tokens = self.max_answer_tokens;
        let (question, owned_context) = (question.to_string(), context.to_string());
        let best = tokio::task::spawn_blocking(move || {
            run_qa(&loaded, &question, &owned_context, max_answer_tokens)
        })
        .await??;

        match best {
            Some(span) if span.score >= self.min_score => {
                debug!(score = span.score, "QA span selected");
                Ok(Answer::from_span(context, span.start, span.end, span.score))
            }
            Some(span) => {
                debug!(score = span.score, min = self.min_score, "QA span below threshold");
                Ok(Answer::empty())
            }
            None => Ok(Answer::empty()),
        }
    }
}

/// Best answer span in byte offsets of the context.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    start: usize,
    end: usize,
    score: f32,
}

fn run_qa(
    loaded: &Loaded,
    question: &str,
    context: &str,
    max_answer_tokens: usize,
) -> Result<Option<Span>> {
    let encoding = loaded
        .tokenizer
        .encode((question, context), true)
        .map_err(|e| anyhow!("Tokenize: {}", e))?;

    let windows = std::iter::once(&encoding).chain(encoding.get_overflowing().iter());
    let mut best: Option<Span> = None;

    for window in windows {
        let ids: Vec<i64> = window.get_ids().iter().map(|&i| i as i64).collect();
        let mask: Vec<i64> = window
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let len = ids.len();

        let ids_t: Tensor = ndarray::Array2::from_shape_vec((1, len), ids)
            .map_err(|e| anyhow!("Input ids shape: {}", e))?
            .into();
        let mask_t: Tensor = ndarray::Array2::from_shape_vec((1, len), mask)
            .map_err(|e| anyhow!("Attention mask shape: {}", e))?
            .into();
        let outputs = loaded.model.run(tvec!(ids_t.into(), mask_t.into()))?;
        if outputs.len() < 2 {
            return Err(anyhow!("QA model returned {} outputs, expected 2", outputs.len()));
        }
        let start_logits: Vec<f32> = outputs[0].to_array_view::<f32>()?.iter().copied().collect();
        let end_logits: Vec<f32> = outputs[1].to_array_view::<f32>()?.iter().copied().collect();

        let context_tokens: Vec<usize> = window
            .get_sequence_ids()
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Some(1))
            .map(|(i, _)| i)
            .collect();

        let Some((s, e, score)) =
            best_span(&start_logits, &end_logits, &context_tokens, max_answer_tokens)
        else {
            continue;
        };
        let offsets = window.get_offsets();
        let span = Span {
            start: offsets[s].0,
            end: offsets[e].1,
            score,
        };
        if best.map_or(true, |b| span.score > b.score) {
            best = Some(span);
        }
    }

    Ok(best)
}

/// Softmax of `logits` restricted to `positions`.
fn masked_softmax(logits: &[f32], positions: &[usize]) -> Vec<f32> {
    let max = positions
        .iter()
        .filter_map(|&i| logits.get(i))
        .fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let exps: Vec<f32> = positions
        .iter()
        .map(|&i| logits.get(i).map_or(0.0, |&v| (v - max).exp()))
        .collect();
    let sum: f32 = exps.iter().sum();
    if sum <= 0.0 {
        return vec![0.0; positions.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Token indices `(start, end, p_start * p_end)` of the best span whose
/// tokens all lie in `positions`, with `end >= start` and at most
/// `max_len` tokens. `positions` must be ascending.
fn best_span(
    start_logits: &[f32],
    end_logits: &[f32],
    positions: &[usize],
    max_len: usize,
) -> Option<(usize, usize, f32)> {
    let p_start = masked_softmax(start_logits, positions);
    let p_end = masked_softmax(end_logits, positions);

    let mut best: Option<(usize, usize, f32)> = None;
    for (a, &s) in positions.iter().enumerate() {
        for (b, &e) in positions.iter().enumerate().skip(a) {
            if e - s + 1 > max_len {
                break;
            }
            let score = p_start[a] * p_end[b];
            if best.map_or(true, |(_, _, x)| score > x) {
                best = Some((s, e, score));
            }
        }
    }
    best
}
