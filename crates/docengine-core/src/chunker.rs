//! Deterministic sliding-window chunking.
//!
//! Offsets are counted in chars so a window never splits a UTF-8 sequence.
//! A text that fits in one window yields exactly one chunk; longer texts are
//! cut into `[start, start + chunk_size)` windows advancing by
//! `chunk_size - overlap` until `start` reaches the end of the text. The
//! final window may be shorter than `chunk_size` and is never padded.

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};

/// Validated `(chunk_size, overlap)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        step_size(chunk_size, overlap)?;
        Ok(Self { chunk_size, overlap })
    }

    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.overlap)
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }

    pub fn overlap(&self) -> usize { self.overlap }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        slice_spans(text, &spans(char_len(text), self.chunk_size, self.chunk_size - self.overlap))
    }

    pub fn spans(&self, text: &str) -> Vec<(usize, usize)> {
        spans(char_len(text), self.chunk_size, self.chunk_size - self.overlap)
    }
}

/// Split `text` into overlapping windows.
///
/// Fails with [`Error::InvalidConfiguration`] when `chunk_size` is zero or
/// `overlap >= chunk_size`. Empty text yields no chunks.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(Chunker::new(chunk_size, overlap)?.chunk(text))
}

/// Same windows as [`chunk`], as half-open char offset spans.
pub fn chunk_spans(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<(usize, usize)>> {
    Ok(Chunker::new(chunk_size, overlap)?.spans(text))
}

fn step_size(chunk_size: usize, overlap: usize) -> Result<usize> {
    if chunk_size == 0 {
        return Err(Error::InvalidConfiguration("chunk_size must be positive".to_string()));
    }
    if overlap >= chunk_size {
        return Err(Error::InvalidConfiguration(format!(
            "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
        )));
    }
    Ok(chunk_size - overlap)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn spans(len: usize, chunk_size: usize, step: usize) -> Vec<(usize, usize)> {
    if len == 0 {
        return Vec::new();
    }
    if len <= chunk_size {
        return vec![(0, len)];
    }
    let mut out = Vec::with_capacity(len / step + 1);
    let mut start = 0;
    while start < len {
        out.push((start, (start + chunk_size).min(len)));
        start += step;
    }
    out
}

fn slice_spans(text: &str, spans: &[(usize, usize)]) -> Vec<String> {
    if spans.is_empty() {
        return Vec::new();
    }
    // byte offset of every char boundary, including the end of the text
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    spans.iter().map(|&(s, e)| text[offsets[s]..offsets[e]].to_string()).collect()
}
