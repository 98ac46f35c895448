//! All-pairs cosine similarity over a small set of vectors.

use serde::Serialize;

use docengine_core::error::{Error, Result};
use docengine_core::types::Vector;

use crate::distance::{dot, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairScore {
    pub first: usize,
    pub second: usize,
    pub score: f32,
}

/// Cosine similarity of every pair `(i, j)` with `i < j`, in row-major order.
pub fn similarity_matrix(vectors: &[Vector]) -> Result<Vec<PairScore>> {
    let units = normalize_all(vectors)?;
    let mut out = Vec::with_capacity(units.len() * units.len().saturating_sub(1) / 2);
    for i in 0..units.len() {
        for j in (i + 1)..units.len() {
            out.push(PairScore { first: i, second: j, score: dot(&units[i], &units[j]) });
        }
    }
    Ok(out)
}

/// The pair with the highest similarity; the earliest pair wins ties.
/// `None` for fewer than two vectors.
pub fn most_similar_pair(vectors: &[Vector]) -> Result<Option<PairScore>> {
    let pairs = similarity_matrix(vectors)?;
    Ok(pairs.into_iter().fold(None, |best: Option<PairScore>, p| match best {
        Some(b) if b.score >= p.score => Some(b),
        _ => Some(p),
    }))
}

fn normalize_all(vectors: &[Vector]) -> Result<Vec<Vector>> {
    let dim = vectors.first().map_or(0, Vec::len);
    vectors
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if v.len() != dim {
                return Err(Error::DimensionMismatch { context: "pairwise vector", expected: dim, actual: v.len() });
            }
            normalize(v).ok_or(Error::DegenerateVector { chunk_id: i })
        })
        .collect()
}
