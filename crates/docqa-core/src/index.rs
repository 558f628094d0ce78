//! Exact in-memory nearest-neighbour index.
//!
//! [`VectorIndex`] owns a copy of every vector it was built from and
//! answers k-NN queries by brute-force squared Euclidean distance (L2²).
//! Results are ascending by distance; equal distances keep insertion
//! order. At the scale of one document (tens to low hundreds of chunks)
//! a linear scan is cheaper than maintaining an approximate structure.

use crate::embedding::squared_l2;
use crate::error::IndexError;
use crate::models::Neighbor;

/// Flat L2 index over vectors of one dimensionality.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    dims: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Build an index over `vectors`, which must all share one length.
    ///
    /// An empty input builds an empty index whose searches return nothing.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
        if let Some((position, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dims) {
            return Err(IndexError::DimensionMismatch {
                expected: dims,
                found: v.len(),
                position,
            });
        }
        Ok(Self { dims, vectors })
    }

    /// Vector dimensionality (`0` for an empty index).
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Return the `min(k, len)` nearest vectors to `query`.
    ///
    /// Results are sorted by non-decreasing distance with ties broken by
    /// ascending position. An empty index or `k == 0` yields no results.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dims {
            return Err(IndexError::QueryDimensionMismatch {
                expected: self.dims,
                found: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, v)| Neighbor {
                position,
                distance: squared_l2(query, v),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }
}
