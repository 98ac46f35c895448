use crate::error::{Error, Result};
use crate::types::{Document, Vector};

/// Turns text into fixed-dimension vectors.
pub trait EmbedProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g., `hash:xxh64:d1024`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Largest batch accepted by `embed_batch`, if the provider has one.
    fn max_batch(&self) -> Option<usize>;
    /// One vector per input text, in input order. Never truncates: an
    /// oversize batch fails with [`Error::BatchTooLarge`].
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>>;
}

/// Reject a batch larger than `max`, for use at the top of `embed_batch`.
pub fn ensure_batch_size(len: usize, max: Option<usize>) -> Result<()> {
    match max {
        Some(max) if len > max => Err(Error::BatchTooLarge { len, max }),
        _ => Ok(()),
    }
}

/// Supplies `(document_id, full_text)` pairs in a stable order.
pub trait DocumentSource {
    fn documents(&self) -> Result<Vec<Document>>;
}

impl DocumentSource for [Document] {
    fn documents(&self) -> Result<Vec<Document>> {
        Ok(self.to_vec())
    }
}

impl DocumentSource for Vec<Document> {
    fn documents(&self) -> Result<Vec<Document>> {
        Ok(self.clone())
    }
}
