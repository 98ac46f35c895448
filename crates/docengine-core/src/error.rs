use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The embedding provider failed (network, auth, quota, model load).
    #[error("Embedding provider error: {0}")]
    Provider(String),

    #[error("Batch too large: {len} texts exceeds provider limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A stored vector has zero (or non-finite) norm and cannot be normalized.
    #[error("Degenerate vector for chunk {chunk_id}: norm is zero or not finite")]
    DegenerateVector { chunk_id: usize },

    #[error("Degenerate query vector: norm is zero or not finite")]
    DegenerateQuery,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document source error: {0}")]
    Source(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
