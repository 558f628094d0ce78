//! TOML configuration.
//!
//! Every section has serde defaults, so an empty file (or no file at all,
//! see [`Config::default`]) runs with the built-in settings:
//!
//! ```toml
//! [chunking]
//! chunk_size = 500
//! overlap = 100
//!
//! [retrieval]
//! top_k = 5
//! cache_capacity = 8
//! history_limit = 50
//!
//! [embedding]
//! provider = "local"          # hash | local | ollama | openai
//! model = "all-minilm-l6-v2"
//!
//! [answer]
//! provider = "lexical"        # lexical | onnx
//! min_score = 0.25
//!
//! [sanitizer]
//! blocked_terms = []
//! blocked_terms_path = "bad_words.txt"
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! max_sessions = 64
//!
//! [logging]
//! level = "info"
//! format = "compact"          # compact | json
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use docqa_core::chunk::{ChunkParams, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use docqa_core::retrieve::{RetrievalParams, DEFAULT_TOP_K};
use docqa_core::session::{DEFAULT_CACHE_CAPACITY, DEFAULT_HISTORY_LIMIT};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default)]
    pub sanitizer: SanitizerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validated chunking and search parameters.
    pub fn retrieval_params(&self) -> Result<RetrievalParams> {
        Ok(RetrievalParams::new(
            self.chunking.chunk_size,
            self.chunking.overlap,
            self.retrieval.top_k,
        )?)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Indexes kept per session.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Turns remembered per session; older turns are dropped.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}
fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            url: None,
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_remote(&self) -> bool {
        matches!(self.provider.as_str(), "openai" | "ollama")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    #[serde(default = "default_answer_provider")]
    pub provider: String,
    /// Hugging Face repository of the ONNX QA model.
    #[serde(default)]
    pub model: Option<String>,
    /// Answers scoring below this are reported as not found.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    #[serde(default = "default_max_answer_tokens")]
    pub max_answer_tokens: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            provider: default_answer_provider(),
            model: None,
            min_score: default_min_score(),
            max_answer_tokens: default_max_answer_tokens(),
        }
    }
}

fn default_answer_provider() -> String {
    "lexical".to_string()
}
fn default_min_score() -> f32 {
    docqa_core::answer::DEFAULT_LEXICAL_MIN_SCORE
}
fn default_max_answer_tokens() -> usize {
    30
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SanitizerConfig {
    #[serde(default)]
    pub blocked_terms: Vec<String>,
    /// Word list file, one term per line.
    #[serde(default)]
    pub blocked_terms_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Open sessions kept; the least recently used one is closed when a
    /// new session would exceed this.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

fn default_max_sessions() -> usize {
    64
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Check cross-field constraints that serde cannot express.
pub fn validate(config: &Config) -> Result<()> {
    ChunkParams::new(config.chunking.chunk_size, config.chunking.overlap)
        .context("Invalid [chunking] section")?;

    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.history_limit == 0 {
        bail!("retrieval.history_limit must be > 0");
    }
    if config.server.max_sessions == 0 {
        bail!("server.max_sessions must be > 0");
    }

    match config.embedding.provider.as_str() {
        "hash" | "local" | "ollama" | "openai" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be hash, local, ollama, or openai.",
            other
        ),
    }

    if config.embedding.is_remote() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }
    if config.embedding.dims == Some(0) {
        bail!("embedding.dims must be > 0");
    }
    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }

    match config.answer.provider.as_str() {
        "lexical" | "onnx" => {}
        other => bail!(
            "Unknown answer provider: '{}'. Must be lexical or onnx.",
            other
        ),
    }

    if !(0.0..=1.0).contains(&config.answer.min_score) {
        bail!("answer.min_score must be in [0.0, 1.0]");
    }
    if config.answer.max_answer_tokens == 0 {
        bail!("answer.max_answer_tokens must be > 0");
    }

    match config.logging.format.as_str() {
        "compact" | "json" => {}
        other => bail!("Unknown logging format: '{}'. Must be compact or json.", other),
    }

    Ok(())
}

/// Load a blocked-term list: one term per line, trimmed and lower-cased.
///
/// A missing file yields an empty set.
pub fn load_blocked_terms(path: &Path) -> Result<BTreeSet<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to read blocked terms file: {}", path.display())
            })
        }
    };

    Ok(content
        .lines()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect())
}

/// Configured inline terms plus the word list file, if any.
pub fn blocked_terms(config: &SanitizerConfig) -> Result<BTreeSet<String>> {
    let mut terms: BTreeSet<String> = config
        .blocked_terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if let Some(path) = &config.blocked_terms_path {
        terms.extend(load_blocked_terms(path)?);
    }
    Ok(terms)
}
