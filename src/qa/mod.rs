//! Answer extractor selection.
//!
//! `lexical` is the model-free sentence selector from `docqa-core`;
//! `onnx` runs a SQuAD-style extractive QA model with tract (feature
//! `qa-onnx`).

#[cfg(feature = "qa-onnx")]
mod onnx;

use anyhow::{bail, Result};
use std::sync::Arc;

use docqa_core::answer::{AnswerExtractor, LexicalExtractor};

use crate::config::AnswerConfig;

#[cfg(feature = "qa-onnx")]
pub use onnx::OnnxQaExtractor;

/// Create the [`AnswerExtractor`] named by `config.provider`.
///
/// Model-backed extractors are loaded here, once.
pub fn create_extractor(config: &AnswerConfig) -> Result<Arc<dyn AnswerExtractor>> {
    match config.provider.as_str() {
        "lexical" => Ok(Arc::new(LexicalExtractor::new(config.min_score))),
        #[cfg(feature = "qa-onnx")]
        "onnx" => Ok(Arc::new(OnnxQaExtractor::new(config)?)),
        #[cfg(not(feature = "qa-onnx"))]
        "onnx" => bail!("The onnx answer provider requires --features qa-onnx"),
        other => bail!("Unknown answer provider: {}", other),
    }
}
