//! Startup wiring: configuration in, ready [`Assistant`] out.
//!
//! This is the only place where a model failure stops the process.
//! Once built, the assistant converts every per-question failure into a
//! [`Reply`](docqa_core::assistant::Reply).

use anyhow::{Context, Result};
use tracing::info;

use docqa_core::assistant::Assistant;
use docqa_core::retrieve::ContextRetriever;
use docqa_core::sanitize::Sanitizer;
use docqa_core::session::Session;

use crate::config::{self, Config};
use crate::embedding::create_provider;
use crate::qa::create_extractor;

/// Load the models and compile the sanitizer described by `cfg`.
pub fn build_assistant(cfg: &Config) -> Result<Assistant> {
    let params = cfg.retrieval_params()?;

    let terms = config::blocked_terms(&cfg.sanitizer)?;
    let sanitizer = Sanitizer::new(&terms).context("Failed to compile blocked terms")?;

    let provider = create_provider(&cfg.embedding).context("Failed to load embedding model")?;
    let extractor = create_extractor(&cfg.answer).context("Failed to load answer model")?;

    info!(
        embedding = provider.model_name(),
        dims = provider.dims(),
        extractor = extractor.name(),
        blocked_terms = terms.len(),
        chunk_size = params.chunk.chunk_size(),
        overlap = params.chunk.overlap(),
        top_k = params.top_k,
        "assistant ready"
    );

    Ok(Assistant::new(
        sanitizer,
        ContextRetriever::new(provider, params),
        extractor,
    ))
}

/// [`build_assistant`] on tokio's blocking pool.
///
/// Model constructors download and parse files with blocking I/O, which
/// must not run on an async worker thread.
pub async fn load_assistant(cfg: &Config) -> Result<Assistant> {
    let cfg = cfg.clone();
    tokio::task::spawn_blocking(move || build_assistant(&cfg))
        .await
        .context("Model loading task failed")?
}

/// A fresh session sized by `[retrieval].cache_capacity` and
/// `[retrieval].history_limit`.
pub fn new_session(cfg: &Config) -> Session {
    Session::new(cfg.retrieval.cache_capacity).with_history_limit(cfg.retrieval.history_limit)
}
