//! Exact in-memory index with brute-force top-k search.
//!
//! Every row is L2-normalized at build time. For unit vectors
//! `||a - b||^2 = 2 - 2 cos(a, b)`, so ascending squared L2 distance ranks
//! exactly like descending cosine similarity. Search is O(N·D) per query.

use std::cmp::Ordering;

use docengine_core::error::{Error, Result};
use docengine_core::types::{ChunkMeta, Neighbor, Vector};

use crate::distance::{normalize, normalize_in_place, squared_l2};

/// Immutable after `build`; safe to search from many threads at once.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    dim: Option<usize>,
    /// Row-major `len × dim` buffer of unit vectors.
    data: Vec<f32>,
    meta: Vec<ChunkMeta>,
}

impl FlatIndex {
    /// Build from vectors and their position-aligned metadata.
    ///
    /// Fails with `DimensionMismatch` when the two sequences differ in
    /// length or the vectors differ in dimension, and with
    /// `DegenerateVector` (naming the chunk) for a zero or non-finite
    /// vector. Nothing is returned on failure. Zero vectors in is a valid,
    /// empty index.
    pub fn build(vectors: &[Vector], meta: Vec<ChunkMeta>) -> Result<Self> {
        if vectors.len() != meta.len() {
            return Err(Error::DimensionMismatch {
                context: "index metadata",
                expected: vectors.len(),
                actual: meta.len(),
            });
        }
        let Some(first) = vectors.first() else {
            tracing::debug!("Built empty index");
            return Ok(Self::default());
        };
        let dim = first.len();
        let mut data = Vec::with_capacity(vectors.len() * dim);
        for (v, m) in vectors.iter().zip(&meta) {
            if v.len() != dim {
                return Err(Error::DimensionMismatch { context: "index vector", expected: dim, actual: v.len() });
            }
            let start = data.len();
            data.extend_from_slice(v);
            if !normalize_in_place(&mut data[start..]) {
                return Err(Error::DegenerateVector { chunk_id: m.id });
            }
        }
        tracing::debug!("Built flat index: {} vectors, dim {}", meta.len(), dim);
        Ok(Self { dim: Some(dim), data, meta })
    }

    /// The `min(k, len)` nearest rows to `query`, closest first; equal
    /// distances keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be positive".to_string()));
        }
        let Some(dim) = self.dim else { return Ok(Vec::new()) };
        if query.len() != dim {
            return Err(Error::DimensionMismatch { context: "query", expected: dim, actual: query.len() });
        }
        let q = normalize(query).ok_or(Error::DegenerateQuery)?;

        let mut scored: Vec<Neighbor> = self
            .data
            .chunks_exact(dim)
            .enumerate()
            .map(|(position, row)| Neighbor { position, distance: squared_l2(&q, row) })
            .collect();
        let k = k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_position);
            scored.truncate(k);
        }
        scored.sort_by(by_distance_then_position);
        Ok(scored)
    }

    pub fn len(&self) -> usize { self.meta.len() }

    pub fn is_empty(&self) -> bool { self.meta.is_empty() }

    /// Dimension of the stored vectors; `None` for an empty index.
    pub fn dim(&self) -> Option<usize> { self.dim }

    pub fn meta(&self, position: usize) -> Option<&ChunkMeta> { self.meta.get(position) }

    /// The normalized vector stored at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let dim = self.dim?;
        self.data.get(position * dim..(position + 1) * dim)
    }
}

fn by_distance_then_position(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position))
}
