//! Overlapping word-window text chunker.
//!
//! Splits a document into [`Chunk`]s of at most `chunk_size` words. Each
//! window starts `chunk_size - overlap` words after the previous one, so
//! consecutive chunks share `overlap` words of context.
//!
//! # Algorithm
//!
//! 1. Split the text on Unicode whitespace into `N` words.
//! 2. Emit a window at word `0`, then every `chunk_size - overlap` words,
//!    while the start index is below `N`.
//! 3. Each window is the space-joined words `start..min(start + chunk_size, N)`.
//!
//! An empty (or all-whitespace) document yields no chunks. The last chunk
//! may be shorter than `chunk_size`; no chunk is ever empty.
//!
//! # Example
//!
//! ```rust
//! use docqa_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("a b c d e", 3, 1).unwrap();
//! assert_eq!(chunks, vec!["a b c", "c d e", "e"]);
//! ```

use serde::Serialize;

use crate::error::ConfigurationError;
use crate::models::Chunk;

/// Default window size in words.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default overlap between consecutive windows, in words.
pub const DEFAULT_OVERLAP: usize = 100;

/// Validated chunking parameters.
///
/// Construction through [`ChunkParams::new`] guarantees
/// `0 <= overlap < chunk_size`, so the window always advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChunkParams {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkParams {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigurationError> {
        if chunk_size == 0 {
            return Err(ConfigurationError::ZeroChunkSize);
        }
        if overlap >= chunk_size {
            return Err(ConfigurationError::OverlapTooLarge {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Words between consecutive window starts. Always `>= 1`.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Split `text` into overlapping word windows.
pub fn chunk_words(text: &str, params: &ChunkParams) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let n = words.len();

    (0..n)
        .step_by(params.step())
        .enumerate()
        .map(|(index, start)| {
            let end = (start + params.chunk_size).min(n);
            Chunk {
                index,
                start_word: start,
                text: words[start..end].join(" "),
            }
        })
        .collect()
}

/// Chunk `text` and return only the window texts.
///
/// Fails with [`ConfigurationError`] when `overlap >= chunk_size` or
/// `chunk_size == 0`.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>, ConfigurationError> {
    let params = ChunkParams::new(chunk_size, overlap)?;
    Ok(chunk_words(text, &params)
        .into_iter()
        .map(|c| c.text)
        .collect())
}
