//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement, plus [`HashingProvider`], a deterministic model-free
//! embedder used for tests and offline runs.
//!
//! Model-backed providers (fastembed, tract, Ollama, OpenAI) live in the
//! `docqa` application crate. They are constructed once at startup and
//! shared read-only across requests.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::text;

/// Trait for embedding providers.
///
/// `embed` must be a pure function of the input texts and the provider's
/// model: identical input yields identical vectors, one per input, in
/// input order, all of length [`dims`](EmbeddingProvider::dims).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed a single query text.
///
/// Convenience wrapper around [`EmbeddingProvider::embed`] for
/// single-text use cases such as embedding a question.
pub async fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    let results = provider.embed(&[text.to_string()]).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Empty embedding response"))
}

/// Default dimensionality of [`HashingProvider`].
pub const DEFAULT_HASHING_DIMS: usize = 384;

/// Feature-hashing bag-of-words embedder.
///
/// Each lower-cased word is hashed with SHA-256 into one of `dims`
/// buckets with a ±1 sign; the resulting count vector is L2-normalized.
/// Texts sharing words land close together, which is enough for exact
/// lexical retrieval without downloading a model.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dims: usize,
}

impl HashingProvider {
    pub fn new(dims: usize) -> Result<Self> {
        if dims == 0 {
            bail!("hashing provider dims must be > 0");
        }
        Ok(Self { dims })
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dims];
        for word in text::words(text) {
            let digest = Sha256::digest(text::stem(&word).as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dims as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        normalize_l2(v)
    }
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self {
            dims: DEFAULT_HASHING_DIMS,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn model_name(&self) -> &str {
        "hash"
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Scale `v` to unit length. Near-zero vectors are returned unchanged.
pub fn normalize_l2(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-9 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Squared Euclidean distance between two vectors of equal length.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_hashing_deterministic_and_ordered() {
        let p = HashingProvider::default();
        let texts = strings(&["the cat sat", "dogs run fast", "the cat sat"]);
        let a = p.embed(&texts).await.unwrap();
        let b = p.embed(&texts).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert_eq!(a[0], a[2]);
        assert_ne!(a[0], a[1]);
        assert!(a.iter().all(|v| v.len() == DEFAULT_HASHING_DIMS));
    }

    #[tokio::test]
    async fn test_hashing_similar_texts_are_closer() {
        let p = HashingProvider::new(256).unwrap();
        let v = p
            .embed(&strings(&[
                "where did the cat sit",
                "the cat sat on the mat",
                "quarterly revenue grew strongly",
            ]))
            .await
            .unwrap();
        assert!(squared_l2(&v[0], &v[1]) < squared_l2(&v[0], &v[2]));
    }

    #[tokio::test]
    async fn test_hashing_empty_text_is_zero_vector() {
        let p = HashingProvider::new(8).unwrap();
        let v = embed_query(&p, "").await.unwrap();
        assert_eq!(v, vec![0.0; 8]);
    }

    #[test]
    fn test_hashing_zero_dims_rejected() {
        assert!(HashingProvider::new(0).is_err());
    }

    #[test]
    fn test_normalize_l2_unit_length() {
        let v = normalize_l2(vec![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[1.0, 2.0], &[4.0, 6.0]), 25.0);
        assert_eq!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }
}
