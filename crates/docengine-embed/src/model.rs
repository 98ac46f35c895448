use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use docengine_core::config::{expand_path, EmbeddingConfig};
use docengine_core::error::{Error, Result};
use docengine_core::traits::{ensure_batch_size, EmbedProvider};
use docengine_core::types::Vector;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::provider_err;
use crate::tokenize::tokenize_batch;

/// BGE-M3 (XLM-RoBERTa) loaded from a local directory holding
/// `tokenizer.json`, `config.json` and `pytorch_model.bin`.
pub struct LocalModelProvider {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    max_batch: usize,
    id: String,
}

impl LocalModelProvider {
    pub fn load(config: &EmbeddingConfig) -> Result<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir(config.model_dir.as_deref())?;
        tracing::info!("Loading BGE-M3 model from {}", model_dir.display());

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| provider_err(format!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e)))?;

        let config_path = model_dir.join("config.json");
        let model_config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| provider_err(format!("Invalid model config {}: {}", config_path.display(), e)))?;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path).map_err(provider_err)?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&model_config, vb).map_err(provider_err)?;
        tracing::info!("BGE-M3 model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            dim: config.dim,
            max_len: config.max_len,
            max_batch: config.max_batch,
            id: format!("local:bge-m3:d{}", config.dim),
        })
    }

    fn forward(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like().map_err(provider_err)?;
        let hidden = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)
            .map_err(provider_err)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask).map_err(provider_err)?;
        pooled.to_device(&Device::Cpu).and_then(|t| t.to_vec2::<f32>()).map_err(provider_err)
    }
}

impl EmbedProvider for LocalModelProvider {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn max_batch(&self) -> Option<usize> { Some(self.max_batch) }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        ensure_batch_size(texts.len(), Some(self.max_batch))?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let vectors = self.forward(texts)?;
        if let Some(v) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(Error::DimensionMismatch { context: "model output", expected: self.dim, actual: v.len() });
        }
        tracing::debug!("Embedded {} texts in {:?}", texts.len(), start.elapsed());
        Ok(vectors)
    }
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { return Ok(p); }
        return Err(Error::NotFound(format!("embedding.model_dir {}", p.display())));
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(&dir);
            if p.exists() { tracing::info!("Using {}: {}", var, p.display()); return Ok(p); }
        }
    }
    let legacy = Path::new("models/bge-m3");
    if legacy.exists() { return Ok(legacy.to_path_buf()); }
    Err(Error::NotFound("BGE-M3 model directory (set embedding.model_dir or APP_MODEL_DIR)".to_string()))
}
