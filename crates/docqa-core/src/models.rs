//! Data types that flow through the retrieval and answering pipeline.

use serde::Serialize;

/// A contiguous word window of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position of this chunk in the chunk sequence (`0..N`).
    pub index: usize,
    /// Offset of the first word of the window within the document.
    pub start_word: usize,
    /// Space-joined words of the window. Never empty.
    pub text: String,
}

/// One search hit: the indexed position and its squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// A chunk selected for the answer context, with its distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Output of a successful retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    /// The whitespace-normalized question that was embedded.
    pub question: String,
    /// Retrieved chunks, ascending by distance.
    pub chunks: Vec<RetrievedChunk>,
    /// Retrieved chunk texts joined by single spaces, in result order.
    pub context: String,
}

impl Retrieval {
    /// The retrieved chunk texts, in search-result order.
    pub fn chunk_texts(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.chunk.text.clone()).collect()
    }
}

/// An extracted answer span.
///
/// `start..end` is a byte range into the context the answer was drawn
/// from, and `text` equals that slice. An empty `text` means no answer
/// was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    /// Extractor confidence in `[0.0, 1.0]`.
    pub score: f32,
    pub start: usize,
    pub end: usize,
}

impl Answer {
    /// The "not found" answer.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            score: 0.0,
            start: 0,
            end: 0,
        }
    }

    /// Build an answer from a byte span of `context`, trimming surrounding
    /// whitespace. Returns [`Answer::empty`] when the span is out of range,
    /// not on a char boundary, or blank.
    pub fn from_span(context: &str, start: usize, end: usize, score: f32) -> Self {
        let Some(raw) = context.get(start..end) else {
            return Self::empty();
        };
        let lead = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::empty();
        }
        let start = start + lead;
        Self {
            text: trimmed.to_string(),
            score,
            start,
            end: start + trimmed.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_span_trims() {
        let ctx = "alpha  beta gamma";
        let a = Answer::from_span(ctx, 5, 12, 0.5);
        assert_eq!(a.text, "beta");
        assert_eq!(&ctx[a.start..a.end], "beta");
    }

    #[test]
    fn test_from_span_out_of_range() {
        assert!(Answer::from_span("abc", 2, 10, 1.0).is_empty());
    }

    #[test]
    fn test_from_span_non_char_boundary() {
        let ctx = "héllo";
        assert!(Answer::from_span(ctx, 0, 2, 1.0).is_empty());
    }
}
