//! Embedding providers.
//!
//! `HashEmbedder` is deterministic and needs no model files; it backs tests
//! and offline runs. `LocalModelProvider` runs BGE-M3 on candle.
//! Setting `APP_USE_FAKE_EMBEDDINGS=1` forces the hash provider regardless
//! of configuration.

use std::sync::Arc;

use docengine_core::config::{EmbeddingConfig, ProviderKind};
use docengine_core::error::{Error, Result};
use docengine_core::traits::EmbedProvider;

pub mod device;
pub mod hash;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use hash::HashEmbedder;
pub use model::LocalModelProvider;
pub use pool::masked_mean_l2;

pub fn provider_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbedProvider>> {
    if config.dim == 0 {
        return Err(Error::InvalidConfiguration("embedding.dim must be positive".into()));
    }
    if fake_embeddings_forced() {
        tracing::info!("Using HashEmbedder (APP_USE_FAKE_EMBEDDINGS)");
        return Ok(Arc::new(HashEmbedder::new(config.dim).with_max_batch(config.max_batch)));
    }
    match config.provider {
        ProviderKind::Hash => {
            tracing::info!("Using HashEmbedder (d={})", config.dim);
            Ok(Arc::new(HashEmbedder::new(config.dim).with_max_batch(config.max_batch)))
        }
        ProviderKind::Local => Ok(Arc::new(LocalModelProvider::load(config)?)),
    }
}

fn fake_embeddings_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub(crate) fn provider_err(e: impl std::fmt::Display) -> Error {
    Error::Provider(e.to_string())
}
