//! Bounded cache of built indexes.
//!
//! Multi-turn chat asks many questions about the same document. Chunking
//! and embedding dominate the cost of a question, so a [`Session`] keeps
//! an [`IndexCache`] keyed by the SHA-256 of the document text, the chunk
//! parameters, and the embedding model. Entries for a document are
//! dropped when the session's active document changes.
//!
//! [`Session`]: crate::session::Session

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use sha2::{Digest, Sha256};

use crate::chunk::ChunkParams;
use crate::index::VectorIndex;
use crate::models::Chunk;

/// Hex SHA-256 of the document text.
pub fn document_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Identity of a built index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub document_hash: String,
    pub params: ChunkParams,
    pub model: String,
}

impl CacheKey {
    pub fn new(document_hash: &str, params: ChunkParams, model: &str) -> Self {
        Self {
            document_hash: document_hash.to_string(),
            params,
            model: model.to_string(),
        }
    }
}

/// A document's chunks together with the index over their embeddings.
///
/// `index` position `i` holds the embedding of `chunks[i]`.
#[derive(Debug)]
pub struct IndexedDocument {
    pub chunks: Vec<Chunk>,
    pub index: VectorIndex,
}

/// LRU cache of [`IndexedDocument`]s.
pub struct IndexCache {
    entries: Mutex<LruCache<CacheKey, Arc<IndexedDocument>>>,
}

impl IndexCache {
    /// Create a cache holding at most `capacity` indexes (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<CacheKey, Arc<IndexedDocument>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<IndexedDocument>> {
        self.entries().get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, doc: Arc<IndexedDocument>) {
        self.entries().put(key, doc);
    }

    /// Drop every entry built from the document with `document_hash`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_document(&self, document_hash: &str) -> usize {
        let mut entries = self.entries();
        let stale: Vec<CacheKey> = entries
            .iter()
            .filter(|(k, _)| k.document_hash == document_hash)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
        stale.len()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Arc<IndexedDocument> {
        Arc::new(IndexedDocument {
            chunks: Vec::new(),
            index: VectorIndex::default(),
        })
    }

    #[test]
    fn test_document_hash_stable() {
        assert_eq!(document_hash("abc"), document_hash("abc"));
        assert_ne!(document_hash("abc"), document_hash("abd"));
        assert_eq!(document_hash("").len(), 64);
    }

    #[test]
    fn test_get_insert() {
        let cache = IndexCache::new(2);
        let key = CacheKey::new("h1", ChunkParams::default(), "hash");
        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), doc());
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn test_key_includes_params_and_model() {
        let cache = IndexCache::new(4);
        cache.insert(CacheKey::new("h1", ChunkParams::default(), "hash"), doc());
        let other_params = CacheKey::new("h1", ChunkParams::new(50, 10).unwrap(), "hash");
        let other_model = CacheKey::new("h1", ChunkParams::default(), "all-minilm-l6-v2");
        assert!(cache.get(&other_params).is_none());
        assert!(cache.get(&other_model).is_none());
    }

    #[test]
    fn test_bounded_evicts_least_recent() {
        let cache = IndexCache::new(2);
        let k1 = CacheKey::new("h1", ChunkParams::default(), "m");
        let k2 = CacheKey::new("h2", ChunkParams::default(), "m");
        let k3 = CacheKey::new("h3", ChunkParams::default(), "m");
        cache.insert(k1.clone(), doc());
        cache.insert(k2.clone(), doc());
        cache.get(&k1);
        cache.insert(k3.clone(), doc());
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&k1).is_some());
        assert!(cache.get(&k2).is_none());
    }

    #[test]
    fn test_invalidate_document() {
        let cache = IndexCache::new(4);
        cache.insert(CacheKey::new("h1", ChunkParams::default(), "m"), doc());
        cache.insert(CacheKey::new("h1", ChunkParams::new(10, 2).unwrap(), "m"), doc());
        cache.insert(CacheKey::new("h2", ChunkParams::default(), "m"), doc());
        assert_eq!(cache.invalidate_document("h1"), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = IndexCache::new(0);
        cache.insert(CacheKey::new("h1", ChunkParams::default(), "m"), doc());
        assert_eq!(cache.len(), 1);
    }
}
