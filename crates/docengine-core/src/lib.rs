//! docengine-core
//!
//! Shared data model, error taxonomy, configuration, text chunking and the
//! provider/source traits the rest of the workspace builds on.

pub mod chunker;
pub mod config;
pub mod documents;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
