//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`,
//! `config.<env>.toml` and `APP_*` env vars (`__` separates nested keys, so
//! `APP_RETRIEVAL__TOP_K=5` sets `retrieval.top_k`). Provides helpers to
//! expand `~` and `${VAR}` and to resolve relative paths against a base dir.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Chunking and ranking parameters consumed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub top_k: usize,
    /// Upper bound on texts per provider call; the provider's own limit
    /// applies when it is smaller.
    pub embed_batch_size: usize,
    pub show_progress: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { chunk_size: 300, overlap: 100, top_k: 3, embed_batch_size: 100, show_progress: false }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfiguration("retrieval.chunk_size must be positive".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfiguration(format!(
                "retrieval.overlap ({}) must be smaller than retrieval.chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(Error::InvalidConfiguration("retrieval.top_k must be positive".into()));
        }
        if self.embed_batch_size == 0 {
            return Err(Error::InvalidConfiguration("retrieval.embed_batch_size must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Deterministic feature hashing, no model files needed.
    #[default]
    Hash,
    /// BGE-M3 loaded from `model_dir`.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    pub dim: usize,
    pub max_batch: usize,
    pub max_len: usize,
    pub model_dir: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { provider: ProviderKind::Hash, dim: 1024, max_batch: 256, max_len: 256, model_dir: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub docs_dir: String,
    pub extension: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { docs_dir: "documents".to_string(), extension: "txt".to_string() }
    }
}

impl DataConfig {
    pub fn docs_path(&self) -> PathBuf { expand_path(&self.docs_dir) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub data: DataConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.retrieval.validate()?;
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfiguration("embedding.dim must be positive".into()));
        }
        if self.embedding.max_batch == 0 {
            return Err(Error::InvalidConfiguration("embedding.max_batch must be positive".into()));
        }
        if self.embedding.max_len == 0 {
            return Err(Error::InvalidConfiguration("embedding.max_len must be positive".into()));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
    /// Directory that relative `data.docs_dir` / `embedding.model_dir`
    /// values are resolved against, when loaded from an explicit file.
    base_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Self::defaults().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            other => tracing::warn!("Unknown RUST_ENV '{}', using config.toml only", other),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        tracing::debug!("Loaded configuration for env '{}'", env_name);
        Ok(Self { figment, base_dir: None })
    }

    /// Load from one explicit TOML file (plus `APP_*` env overrides).
    /// Relative paths in it are taken relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("config file {}", path.display())));
        }
        let figment = Self::defaults()
            .merge(Toml::file(path))
            .merge(Env::prefixed("APP_").split("__"));
        let base_dir = path.parent().map(Path::to_path_buf);
        Ok(Self { figment, base_dir })
    }

    /// Extract and validate the full settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        settings.validate()?;
        if let Some(base) = &self.base_dir {
            settings.data.docs_dir = resolve_with_base(base, &settings.data.docs_dir).to_string_lossy().into_owned();
            if let Some(dir) = settings.embedding.model_dir.take() {
                settings.embedding.model_dir = Some(resolve_with_base(base, dir).to_string_lossy().into_owned());
            }
        }
        Ok(settings)
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
