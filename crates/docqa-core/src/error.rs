//! Error types for the question-answering pipeline.
//!
//! Each component reports failures through its own typed enum. The
//! [`Assistant`](crate::assistant::Assistant) converts all of them into a
//! [`Reply`](crate::assistant::Reply) so a single question never aborts
//! the caller.

use thiserror::Error;

/// Invalid chunking or retrieval parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// `chunk_size` must be at least one word.
    #[error("chunk_size must be > 0")]
    ZeroChunkSize,

    /// The window would never advance.
    #[error("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },

    /// `top_k` must request at least one neighbour.
    #[error("top_k must be >= 1")]
    ZeroTopK,
}

/// Vector index construction and search failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A vector does not match the dimensionality of the index.
    #[error("dimension mismatch at position {position}: expected {expected}, found {found}")]
    DimensionMismatch {
        expected: usize,
        found: usize,
        position: usize,
    },

    /// The query vector does not match the dimensionality of the index.
    #[error("query has {found} dimensions, index has {expected}")]
    QueryDimensionMismatch { expected: usize, found: usize },
}

/// Failures of a single retrieval request.
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Chunking produced nothing to search.
    #[error("document is empty or too short")]
    EmptyDocument,

    /// Search returned no usable text.
    #[error("no relevant context found")]
    NoContext,

    /// The embedding provider failed or returned malformed output.
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// The blocked-term pattern could not be compiled.
#[derive(Debug, Error)]
#[error("invalid blocked-term pattern: {0}")]
pub struct SanitizeError(#[from] pub regex::Error);
