//! Domain types shared by the chunker, the index and the pipeline.

use serde::{Deserialize, Serialize};

pub type ChunkId = usize;
pub type Vector = Vec<f32>;

/// A source document as handed over by a [`crate::traits::DocumentSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// A contiguous window of a source document that is independently embedded.
///
/// - `id`: build-wide identifier, assigned in creation order starting at 0
/// - `source`: identifier of the document the chunk was cut from
/// - `text`: the chunk payload
/// - `position`: ordinal of the chunk within its document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub source: String,
    pub text: String,
    pub position: usize,
}

impl Chunk {
    pub fn meta(&self) -> ChunkMeta {
        ChunkMeta { id: self.id, source: self.source.clone() }
    }
}

/// Metadata stored alongside each indexed vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub id: ChunkId,
    pub source: String,
}

/// Raw output of a nearest-neighbor search: the row position in the index
/// and its squared L2 distance to the normalized query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

impl Neighbor {
    /// Cosine similarity recovered from the distance between unit vectors:
    /// `||a - b||^2 = 2 - 2 cos(a, b)`.
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance / 2.0
    }
}

/// One ranked hit returned to query callers. `rank` starts at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rank: usize,
    pub chunk_id: ChunkId,
    pub source: String,
    pub score: f32,
    pub distance: f32,
    pub text: String,
}

/// Summary of a completed index build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildStats {
    pub documents: usize,
    pub chunks: usize,
    pub dim: Option<usize>,
}
