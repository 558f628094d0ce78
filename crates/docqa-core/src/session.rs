//! Per-user conversation state.
//!
//! A [`Session`] owns one active document, the chat history, and its own
//! [`IndexCache`]. Sessions never share per-document state, so concurrent
//! users only share the read-only models behind the
//! [`Assistant`](crate::assistant::Assistant).

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::assistant::Reply;
use crate::cache::{document_hash, IndexCache};

/// Default number of indexes a session keeps.
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

/// Default number of turns a session remembers.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// The document a session is currently asking about.
#[derive(Debug, Clone)]
pub struct ActiveDocument {
    name: String,
    text: Arc<str>,
    hash: String,
}

impl ActiveDocument {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Hex SHA-256 of the text.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// One question and the reply it received. Retrieved chunks are not
/// kept in history.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub question: String,
    pub reply: Reply,
}

pub struct Session {
    document: Option<ActiveDocument>,
    history: Vec<Turn>,
    history_limit: usize,
    cache: IndexCache,
}

impl Session {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            document: None,
            history: Vec::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            cache: IndexCache::new(cache_capacity),
        }
    }

    /// Keep only the latest `limit` turns (minimum 1).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Make `text` the active document.
    ///
    /// When the content differs from the current document, cached indexes
    /// of the previous document are dropped. Returns `true` if the
    /// content changed.
    pub fn load_document(&mut self, name: impl Into<String>, text: impl Into<String>) -> bool {
        let text: String = text.into();
        let hash = document_hash(&text);
        let name = name.into();

        if let Some(current) = &mut self.document {
            if current.hash == hash {
                current.name = name;
                return false;
            }
            let dropped = self.cache.invalidate_document(&current.hash);
            debug!(dropped, "active document changed");
        }

        self.document = Some(ActiveDocument {
            name,
            text: Arc::from(text),
            hash,
        });
        true
    }

    /// Unload the active document and drop its cached indexes.
    pub fn clear_document(&mut self) {
        if let Some(doc) = self.document.take() {
            self.cache.invalidate_document(&doc.hash);
        }
    }

    pub fn document(&self) -> Option<&ActiveDocument> {
        self.document.as_ref()
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    pub(crate) fn record(&mut self, question: &str, reply: &Reply) {
        self.history.push(Turn {
            question: question.to_string(),
            reply: reply.without_context(),
        });
        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, IndexedDocument};
    use crate::chunk::ChunkParams;
    use crate::index::VectorIndex;
    use crate::models::{Chunk, RetrievedChunk};

    fn cache_entry(session: &Session, hash: &str) {
        session.cache().insert(
            CacheKey::new(hash, ChunkParams::default(), "hash"),
            Arc::new(IndexedDocument {
                chunks: Vec::new(),
                index: VectorIndex::default(),
            }),
        );
    }

    #[test]
    fn test_load_document() {
        let mut s = Session::default();
        assert!(s.document().is_none());
        assert!(s.load_document("a.pdf", "one two three"));
        let doc = s.document().unwrap();
        assert_eq!(doc.name(), "a.pdf");
        assert_eq!(doc.word_count(), 3);
        assert_eq!(doc.hash(), document_hash("one two three"));
    }

    #[test]
    fn test_same_content_keeps_cache() {
        let mut s = Session::default();
        s.load_document("a.pdf", "same text");
        let hash = s.document().unwrap().hash().to_string();
        cache_entry(&s, &hash);
        assert!(!s.load_document("renamed.pdf", "same text"));
        assert_eq!(s.cache().len(), 1);
        assert_eq!(s.document().unwrap().name(), "renamed.pdf");
    }

    #[test]
    fn test_new_content_invalidates_cache() {
        let mut s = Session::default();
        s.load_document("a.pdf", "first text");
        let hash = s.document().unwrap().hash().to_string();
        cache_entry(&s, &hash);
        assert!(s.load_document("b.pdf", "second text"));
        assert!(s.cache().is_empty());
    }

    #[test]
    fn test_history_keeps_latest_turns_without_context() {
        let mut s = Session::default().with_history_limit(2);
        for q in ["one?", "two?", "three?"] {
            s.record(
                q,
                &Reply::Answer {
                    answer: "a".to_string(),
                    score: 1.0,
                    context: vec![RetrievedChunk {
                        chunk: Chunk {
                            index: 0,
                            start_word: 0,
                            text: "a".to_string(),
                        },
                        distance: 0.0,
                    }],
                },
            );
        }
        let questions: Vec<&str> = s.history().iter().map(|t| t.question.as_str()).collect();
        assert_eq!(questions, vec!["two?", "three?"]);
        assert!(matches!(&s.history()[1].reply, Reply::Answer { context, .. } if context.is_empty()));
    }

    #[test]
    fn test_clear_document() {
        let mut s = Session::default();
        s.load_document("a.pdf", "text");
        let hash = s.document().unwrap().hash().to_string();
        cache_entry(&s, &hash);
        s.clear_document();
        assert!(s.document().is_none());
        assert!(s.cache().is_empty());
    }
}
