//! Load → chunk → embed → index, then answer top-k queries.
//!
//! A build either yields a complete [`Retriever`] or an error; there is no
//! partially built state. A built `Retriever` is read-only, so queries can
//! run concurrently and a failing query never affects the index.

use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use docengine_core::chunker::Chunker;
use docengine_core::config::RetrievalConfig;
use docengine_core::error::{Error, Result};
use docengine_core::traits::{DocumentSource, EmbedProvider};
use docengine_core::types::{BuildStats, Chunk, QueryResult, Vector};
use docengine_vector::FlatIndex;

pub struct RetrievalPipeline {
    config: RetrievalConfig,
    chunker: Chunker,
    provider: Arc<dyn EmbedProvider>,
}

impl RetrievalPipeline {
    pub fn new(config: RetrievalConfig, provider: Arc<dyn EmbedProvider>) -> Result<Self> {
        config.validate()?;
        let chunker = Chunker::from_config(&config)?;
        Ok(Self { config, chunker, provider })
    }

    pub fn config(&self) -> &RetrievalConfig { &self.config }

    /// Texts per provider call: the configured size, capped by the provider.
    pub fn batch_size(&self) -> usize {
        match self.provider.max_batch() {
            Some(max) => self.config.embed_batch_size.min(max).max(1),
            None => self.config.embed_batch_size,
        }
    }

    pub fn build(&self, source: &dyn DocumentSource) -> Result<Retriever> {
        let (documents, chunks) = self.load_and_chunk(source)?;
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embed_all(&texts)?;
        self.finish(documents, chunks, vectors)
    }

    /// Like [`build`](Self::build), but embeds up to `max_in_flight`
    /// batches at once on the blocking pool. Results are reassembled in
    /// input order before indexing.
    pub async fn build_concurrent(&self, source: &dyn DocumentSource, max_in_flight: usize) -> Result<Retriever> {
        let (documents, chunks) = self.load_and_chunk(source)?;
        let batches: Vec<Vec<String>> = chunks
            .chunks(self.batch_size())
            .map(|batch| batch.iter().map(|c| c.text.clone()).collect())
            .collect();
        tracing::info!("Embedding {} chunks in {} batches ({} in flight)", chunks.len(), batches.len(), max_in_flight.max(1));

        let embedded: Vec<Vec<Vector>> = stream::iter(batches.into_iter().map(|batch| {
            let provider = Arc::clone(&self.provider);
            async move {
                match tokio::task::spawn_blocking(move || embed_checked(provider.as_ref(), &batch)).await {
                    Ok(result) => result,
                    Err(e) => Err(Error::Provider(format!("embedding task failed: {e}"))),
                }
            }
        }))
        .buffered(max_in_flight.max(1))
        .try_collect()
        .await?;

        self.finish(documents, chunks, embedded.into_iter().flatten().collect())
    }

    fn load_and_chunk(&self, source: &dyn DocumentSource) -> Result<(usize, Vec<Chunk>)> {
        let documents = source.documents()?;
        let mut chunks = Vec::new();
        for doc in &documents {
            for (position, text) in self.chunker.chunk(&doc.text).into_iter().enumerate() {
                let id = chunks.len();
                chunks.push(Chunk { id, source: doc.id.clone(), text, position });
            }
        }
        tracing::info!("Total chunks created: {} from {} documents", chunks.len(), documents.len());
        Ok((documents.len(), chunks))
    }

    fn embed_all(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let pb = self.progress_bar(texts.len());
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size()) {
            out.extend(embed_checked(self.provider.as_ref(), batch)?);
            pb.inc(batch.len() as u64);
            tracing::debug!("Embedded {}/{} chunks", out.len(), texts.len());
        }
        pb.finish_with_message("embeddings ready");
        Ok(out)
    }

    fn finish(&self, documents: usize, chunks: Vec<Chunk>, vectors: Vec<Vector>) -> Result<Retriever> {
        if vectors.len() != chunks.len() {
            return Err(Error::Provider(format!("got {} vectors for {} chunks", vectors.len(), chunks.len())));
        }
        let meta = chunks.iter().map(Chunk::meta).collect();
        let index = FlatIndex::build(&vectors, meta)?;
        let stats = BuildStats { documents, chunks: chunks.len(), dim: index.dim() };
        tracing::info!("Index ready: {} chunks, dim {:?}, provider {}", stats.chunks, stats.dim, self.provider.embedder_id());
        Ok(Retriever { provider: Arc::clone(&self.provider), top_k: self.config.top_k, chunks, index, stats })
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

/// A built index with its chunks; answers queries until dropped.
pub struct Retriever {
    provider: Arc<dyn EmbedProvider>,
    top_k: usize,
    chunks: Vec<Chunk>,
    index: FlatIndex,
    stats: BuildStats,
}

impl Retriever {
    /// Top-`k` chunks for `text`, best first. Zero-length text is a valid
    /// query with no results and is not sent to the provider.
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<QueryResult>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be positive".to_string()));
        }
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let query = embed_checked(self.provider.as_ref(), &[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::Provider("no vector returned for query".to_string()))?;
        let hits = self.index.search(&query, k)?;
        Ok(hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                let chunk = &self.chunks[hit.position];
                QueryResult {
                    rank: i + 1,
                    chunk_id: chunk.id,
                    source: chunk.source.clone(),
                    score: hit.similarity(),
                    distance: hit.distance,
                    text: chunk.text.clone(),
                }
            })
            .collect())
    }

    /// [`query`](Self::query) with the configured `top_k`.
    pub fn query_top(&self, text: &str) -> Result<Vec<QueryResult>> {
        self.query(text, self.top_k)
    }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }

    pub fn index(&self) -> &FlatIndex { &self.index }

    pub fn stats(&self) -> BuildStats { self.stats }

    pub fn embedder_id(&self) -> &str { self.provider.embedder_id() }
}

/// Call the provider and insist on one vector per input.
fn embed_checked(provider: &dyn EmbedProvider, texts: &[String]) -> Result<Vec<Vector>> {
    let vectors = provider.embed_batch(texts)?;
    if vectors.len() != texts.len() {
        return Err(Error::Provider(format!(
            "{} returned {} vectors for {} texts",
            provider.embedder_id(),
            vectors.len(),
            texts.len()
        )));
    }
    Ok(vectors)
}
