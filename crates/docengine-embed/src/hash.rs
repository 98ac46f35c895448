use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use docengine_core::error::Result;
use docengine_core::traits::{ensure_batch_size, EmbedProvider};
use docengine_core::types::Vector;

/// Feature-hashing embedder: each whitespace token bumps one bucket chosen
/// by its xxHash64, plus one bucket for the whole text so that
/// whitespace-only input still gets a non-zero vector. Output is
/// L2-normalized; empty text maps to the zero vector.
pub struct HashEmbedder {
    dim: usize,
    max_batch: Option<usize>,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self { dim, max_batch: None, id: format!("hash:xxh64:d{dim}") }
    }

    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = Some(max_batch);
        self
    }

    pub fn embed_text(&self, text: &str) -> Vector {
        let mut v = vec![0f32; self.dim];
        if text.is_empty() {
            return v;
        }
        for (i, token) in text.split_whitespace().enumerate() {
            let (idx, val) = self.bucket(token, 0);
            v[idx] += val + (i % 3) as f32 * 0.01;
        }
        let (idx, val) = self.bucket(text, 1);
        v[idx] += 0.5 * val;

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        }
        v
    }

    fn bucket(&self, s: &str, seed: u64) -> (usize, f32) {
        let mut hasher = XxHash64::with_seed(seed);
        s.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h % self.dim as u64) as usize;
        // in (0.5, 1.0] so a feature never contributes zero
        let val = 0.5 + 0.5 * (((h >> 32) as u32) as f32 / u32::MAX as f32);
        (idx, val)
    }
}

impl EmbedProvider for HashEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn max_batch(&self) -> Option<usize> { self.max_batch }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        ensure_batch_size(texts.len(), self.max_batch)?;
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
