use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DataConfig;
use crate::error::{Error, Result};
use crate::traits::DocumentSource;
use crate::types::Document;

/// Reads every file with a given extension under `root`, recursively.
///
/// Files are visited in sorted path order and identified by their path
/// relative to `root` (`/`-separated), so ids are stable across runs.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extension: String,
    limit: Option<usize>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), extension: "txt".to_string(), limit: None }
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(config.docs_path()).with_extension(&config.extension)
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Only read the first `limit` files.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn root(&self) -> &Path { &self.root }

    fn list_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(Error::NotFound(format!("documents directory {}", self.root.display())));
        }
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root) {
            let entry = entry.map_err(|e| Error::Source(e.to_string()))?;
            if !entry.file_type().is_file() { continue; }
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some(self.extension.as_str()) {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        if let Some(limit) = self.limit {
            if files.len() > limit {
                tracing::info!("Limited to first {} of {} files", limit, files.len());
                files.truncate(limit);
            }
        }
        Ok(files)
    }

    fn doc_id(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl DocumentSource for DirectorySource {
    fn documents(&self) -> Result<Vec<Document>> {
        let files = self.list_files()?;
        if files.is_empty() {
            tracing::warn!("No .{} files found under {}", self.extension, self.root.display());
            return Ok(Vec::new());
        }
        let mut docs = Vec::with_capacity(files.len());
        for (i, path) in files.iter().enumerate() {
            tracing::debug!("Reading file {}/{}: {}", i + 1, files.len(), path.display());
            let bytes = fs::read(path)?;
            let text = String::from_utf8(bytes)
                .map_err(|_| Error::Source(format!("{} is not valid UTF-8", path.display())))?;
            docs.push(Document { id: self.doc_id(path), text });
        }
        tracing::info!("Read {} documents from {}", docs.len(), self.root.display());
        Ok(docs)
    }
}
