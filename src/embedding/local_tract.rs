//! Tract-based local embedding pipeline (fallback for musl and Intel Mac).
//!
//! Pure-Rust path: loads the ONNX model with tract-onnx and the tokenizer
//! with the tokenizers crate once, at construction, then runs inference in
//! spawn_blocking. No ONNX Runtime or system deps.
#![cfg_attr(
    all(feature = "local-embeddings-fastembed", feature = "local-embeddings-tract"),
    allow(dead_code)
)]

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tract_onnx::prelude::*;
use tracing::info;

use docqa_core::embedding::{normalize_l2, EmbeddingProvider};

use crate::config::EmbeddingConfig;
use crate::model_cache::ensure_cached;

const ALL_MINILM_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";
const ALL_MINILM_DIMS: usize = 384;
const DEFAULT_MAX_LEN: usize = 256;

/// Model manifest: name -> (repo, onnx path in repo, tokenizer path in repo, dims).
fn model_manifest(model_name: &str) -> Result<(&'static str, &'static str, &'static str, usize)> {
    match model_name {
        "all-minilm-l6-v2" => Ok((
            ALL_MINILM_REPO,
            "onnx/model.onnx",
            "tokenizer.json",
            ALL_MINILM_DIMS,
        )),
        _ => bail!(
            "Tract backend supports only all-minilm-l6-v2 for now. Requested: '{}'",
            model_name
        ),
    }
}

struct Loaded {
    tokenizer: tokenizers::Tokenizer,
    model: TypedRunnableModel<TypedModel>,
}

pub struct TractProvider {
    model_name: String,
    dims: usize,
    batch_size: usize,
    loaded: Arc<Loaded>,
}

impl TractProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_name = config
            .model
            .clone()
            .unwrap_or_else(|| "all-minilm-l6-v2".to_string());
        let (repo, onnx_rel, tokenizer_rel, dims) = model_manifest(&model_name)?;
        let (onnx_path, tokenizer_path) = ensure_cached(&model_name, repo, onnx_rel, tokenizer_rel)?;

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Load tokenizer: {}", e))?;

        let model = tract_onnx::onnx()
            .model_for_path(onnx_path)
            .map_err(|e| anyhow!("Load ONNX: {}", e))?
            .into_optimized()
            .map_err(|e| anyhow!("Optimize: {}", e))?
            .into_runnable()
            .map_err(|e| anyhow!("Build tract runnable: {}", e))?;
        info!(model = %model_name, dims, "loaded tract embedding model");

        Ok(Self {
            model_name,
            dims,
            batch_size: config.batch_size.max(1),
            loaded: Arc::new(Loaded { tokenizer, model }),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for TractProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let loaded = self.loaded.clone();
        let (dims, batch_size) = (self.dims, self.batch_size);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || run_tract_embed(&loaded, dims, batch_size, &texts))
            .await?
    }
}

fn run_tract_embed(
    loaded: &Loaded,
    dims: usize,
    batch_size: usize,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size) {
        let encodings: Vec<_> = chunk
            .iter()
            .map(|s| {
                loaded
                    .tokenizer
                    .encode(s.as_str(), true)
                    .map_err(|e| anyhow!("Tokenize: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(1)
            .clamp(1, DEFAULT_MAX_LEN);

        let rows = encodings.len();
        let mut input_ids = vec![0i64; rows * max_len];
        let mut attention_mask = vec![0i64; rows * max_len];

        for (i, enc) in encodings.iter().enumerate() {
            for (j, &id) in enc.get_ids().iter().take(max_len).enumerate() {
                input_ids[i * max_len + j] = id as i64;
                attention_mask[i * max_len + j] = 1;
            }
        }

        let input_ids_t: Tensor = ndarray::Array2::from_shape_vec((rows, max_len), input_ids)
            .map_err(|e| anyhow!("Input ids shape: {}", e))?
            .into();
        let attention_mask_t: Tensor =
            ndarray::Array2::from_shape_vec((rows, max_len), attention_mask)
                .map_err(|e| anyhow!("Attention mask shape: {}", e))?
                .into();
        let result = loaded
            .model
            .run(tvec!(input_ids_t.into(), attention_mask_t.into()))?;

        let output = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No output tensor"))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| anyhow!("Output to array: {}", e))?;

        // [batch, seq_len, dims] (last_hidden_state) is mean-pooled over
        // valid tokens; [batch, dims] is already pooled.
        let shape = view.shape().to_vec();
        match shape.len() {
            2 => {
                for i in 0..shape[0] {
                    let row = view.slice(ndarray::s![i, ..]);
                    all_embeddings.push(normalize_l2(row.iter().copied().collect()));
                }
            }
            3 => {
                let seq_len = shape[1];
                for (i, enc) in encodings.iter().enumerate() {
                    let valid_len = enc.get_ids().len().min(seq_len).min(max_len);
                    let mut sum = vec![0f32; dims];
                    for j in 0..valid_len {
                        for (k, &v) in view.slice(ndarray::s![i, j, ..]).iter().enumerate() {
                            if k < dims {
                                sum[k] += v;
                            }
                        }
                    }
                    if valid_len > 0 {
                        for x in &mut sum {
                            *x /= valid_len as f32;
                        }
                    }
                    all_embeddings.push(normalize_l2(sum));
                }
            }
            _ => bail!("Unexpected output shape: {:?}", shape),
        }
    }

    Ok(all_embeddings)
}
