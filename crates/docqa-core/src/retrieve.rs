//! Context retrieval: chunk, embed, index, search.
//!
//! [`ContextRetriever`] turns a question and a document into the top-k
//! most relevant chunks and the concatenated context string handed to
//! the answer extractor.
//!
//! # Steps
//!
//! 1. Normalize whitespace in the question.
//! 2. Chunk the document into overlapping word windows; zero chunks is
//!    [`RetrieveError::EmptyDocument`] and the provider is never called.
//! 3. Embed all chunks and build a [`VectorIndex`] over them (or reuse a
//!    cached one, see [`ContextRetriever::retrieve_cached`]).
//! 4. Embed the question and search for the `top_k` nearest chunks.
//! 5. Join the hits, in result order, with single spaces; a blank result
//!    is [`RetrieveError::NoContext`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{document_hash, CacheKey, IndexCache, IndexedDocument};
use crate::chunk::{chunk_words, ChunkParams};
use crate::embedding::{embed_query, EmbeddingProvider};
use crate::error::{ConfigurationError, RetrieveError};
use crate::index::VectorIndex;
use crate::models::{RetrievedChunk, Retrieval};
use crate::text::normalize_whitespace;

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 5;

/// Validated chunking and search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetrievalParams {
    pub chunk: ChunkParams,
    pub top_k: usize,
}

impl RetrievalParams {
    pub fn new(chunk_size: usize, overlap: usize, top_k: usize) -> Result<Self, ConfigurationError> {
        if top_k == 0 {
            return Err(ConfigurationError::ZeroTopK);
        }
        Ok(Self {
            chunk: ChunkParams::new(chunk_size, overlap)?,
            top_k,
        })
    }
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            chunk: ChunkParams::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Orchestrates chunking, embedding, indexing and search for one document.
#[derive(Clone)]
pub struct ContextRetriever {
    provider: Arc<dyn EmbeddingProvider>,
    params: RetrievalParams,
}

impl ContextRetriever {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, params: RetrievalParams) -> Self {
        Self { provider, params }
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Retrieve context for `question`, rebuilding the index from scratch.
    ///
    /// `top_k` overrides the configured default for this call.
    pub async fn retrieve(
        &self,
        question: &str,
        document: &str,
        top_k: Option<usize>,
    ) -> Result<Retrieval, RetrieveError> {
        let k = self.resolve_top_k(top_k)?;
        let indexed = self.index_document(document).await?;
        self.search(question, &indexed, k).await
    }

    /// Like [`retrieve`](Self::retrieve), but reuses an index from `cache`
    /// when the same document was indexed with the same parameters and
    /// model, and stores newly built indexes there.
    pub async fn retrieve_cached(
        &self,
        question: &str,
        document: &str,
        top_k: Option<usize>,
        cache: &IndexCache,
    ) -> Result<Retrieval, RetrieveError> {
        let k = self.resolve_top_k(top_k)?;
        let key = CacheKey::new(
            &document_hash(document),
            self.params.chunk,
            self.provider.model_name(),
        );

        let indexed = match cache.get(&key) {
            Some(hit) => {
                debug!(chunks = hit.chunks.len(), "index cache hit");
                hit
            }
            None => {
                debug!("index cache miss");
                let built = Arc::new(self.index_document(document).await?);
                cache.insert(key, built.clone());
                built
            }
        };
        self.search(question, &indexed, k).await
    }

    /// Chunk and embed `document` and build its index.
    pub async fn index_document(&self, document: &str) -> Result<IndexedDocument, RetrieveError> {
        let chunks = chunk_words(document, &self.params.chunk);
        if chunks.is_empty() {
            return Err(RetrieveError::EmptyDocument);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .provider
            .embed(&texts)
            .await
            .map_err(|e| RetrieveError::Embedding(format!("{:#}", e)))?;
        if vectors.len() != chunks.len() {
            return Err(RetrieveError::Embedding(format!(
                "provider returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let index = VectorIndex::build(vectors)?;
        info!(
            chunks = chunks.len(),
            dims = index.dims(),
            model = self.provider.model_name(),
            "indexed document"
        );
        Ok(IndexedDocument { chunks, index })
    }

    fn resolve_top_k(&self, top_k: Option<usize>) -> Result<usize, RetrieveError> {
        match top_k.unwrap_or(self.params.top_k) {
            0 => Err(ConfigurationError::ZeroTopK.into()),
            k => Ok(k),
        }
    }

    async fn search(
        &self,
        question: &str,
        indexed: &IndexedDocument,
        k: usize,
    ) -> Result<Retrieval, RetrieveError> {
        let question = normalize_whitespace(question);
        let query = embed_query(self.provider.as_ref(), &question)
            .await
            .map_err(|e| RetrieveError::Embedding(format!("{:#}", e)))?;

        let neighbors = indexed.index.search(&query, k)?;
        let chunks: Vec<RetrievedChunk> = neighbors
            .iter()
            .filter_map(|n| {
                indexed.chunks.get(n.position).map(|c| RetrievedChunk {
                    chunk: c.clone(),
                    distance: n.distance,
                })
            })
            .collect();

        let context = chunks
            .iter()
            .map(|c| c.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if context.trim().is_empty() {
            return Err(RetrieveError::NoContext);
        }

        debug!(
            k,
            hits = chunks.len(),
            best_distance = chunks.first().map(|c| c.distance),
            "retrieved context"
        );
        Ok(Retrieval {
            question,
            chunks,
            context,
        })
    }
}
