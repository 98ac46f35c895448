use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::Serialize;

use docengine_core::chunker::Chunker;
use docengine_core::config::{Config, Settings};
use docengine_core::documents::DirectorySource;
use docengine_core::traits::DocumentSource;
use docengine_core::types::QueryResult;
use docengine_embed::provider_from_config;
use docengine_pipeline::{RetrievalPipeline, Retriever};
use docengine_vector::{most_similar_pair, similarity_matrix, PairScore};

pub const SAMPLE_SENTENCES: [&str; 4] = [
    "I love artificial intelligence",
    "Machine learning is fascinating",
    "I enjoy AI technology",
    "Cooking recipes are fun",
];

/// Settings from an explicit file, or the layered default lookup.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let config = match path {
        Some(p) => Config::from_file(p).with_context(|| format!("loading config {}", p.display()))?,
        None => Config::load().context("loading config")?,
    };
    Ok(config.settings()?)
}

pub fn document_source(settings: &Settings, docs: Option<PathBuf>, limit: Option<usize>) -> DirectorySource {
    let source = match docs {
        Some(dir) => DirectorySource::new(dir).with_extension(&settings.data.extension),
        None => DirectorySource::from_config(&settings.data),
    };
    match limit {
        Some(n) => source.with_limit(n),
        None => source,
    }
}

#[derive(Debug, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub results: Vec<QueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChunkCount {
    pub source: String,
    pub chars: usize,
    pub chunks: usize,
}

#[derive(Debug, Serialize)]
pub struct Comparison {
    pub sentences: Vec<String>,
    pub pairs: Vec<PairScore>,
    pub best: Option<PairScore>,
}

pub async fn build_retriever(settings: &Settings, source: &DirectorySource, jobs: Option<usize>) -> Result<Retriever> {
    let provider = provider_from_config(&settings.embedding).context("creating embedding provider")?;
    let pipeline = RetrievalPipeline::new(settings.retrieval.clone(), provider)?;
    tracing::info!("Reading documents from {}", source.root().display());
    let built = match jobs {
        Some(n) => pipeline.build_concurrent(source, n).await,
        None => pipeline.build(source),
    };
    built.with_context(|| format!("indexing {}", source.root().display()))
}

/// Run one query; a failure is recorded in the report instead of aborting.
pub fn run_query(retriever: &Retriever, query: &str, k: usize) -> QueryReport {
    match retriever.query(query, k) {
        Ok(results) => QueryReport { query: query.to_string(), results, error: None },
        Err(e) => {
            tracing::warn!("Query {:?} failed: {}", query, e);
            QueryReport { query: query.to_string(), results: Vec::new(), error: Some(e.to_string()) }
        }
    }
}

pub struct SearchArgs {
    pub docs: Option<PathBuf>,
    pub limit: Option<usize>,
    pub k: Option<usize>,
    pub jobs: Option<usize>,
    pub queries: Vec<String>,
}

pub async fn search(settings: &Settings, args: SearchArgs, json: bool) -> Result<()> {
    let SearchArgs { docs, limit, k, jobs, queries } = args;
    let k = k.unwrap_or(settings.retrieval.top_k);
    ensure!(k > 0, "-k must be positive");
    let source = document_source(settings, docs, limit);
    let retriever = build_retriever(settings, &source, jobs).await?;
    let stats = retriever.stats();
    if !json {
        println!(
            "Index ready: {} documents, {} chunks ({})",
            stats.documents,
            stats.chunks,
            retriever.embedder_id()
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if !queries.is_empty() {
        for q in &queries {
            write_report(&mut out, &run_query(&retriever, q, k), json)?;
        }
        return Ok(());
    }
    query_loop(&retriever, k, json, &mut io::stdin().lock(), &mut io::stderr(), &mut out)
}

/// Prompt on `prompt` and answer lines from `input` until `exit` or EOF.
/// Results go to `out` only, so `--json` output stays one object per line.
pub fn query_loop(
    retriever: &Retriever,
    k: usize,
    json: bool,
    input: &mut dyn BufRead,
    prompt: &mut dyn Write,
    out: &mut dyn Write,
) -> Result<()> {
    let mut line = String::new();
    loop {
        write!(prompt, "\nEnter search query (or 'exit'): ")?;
        prompt.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let q = line.trim();
        if q.eq_ignore_ascii_case("exit") {
            break;
        }
        if q.is_empty() {
            continue;
        }
        write_report(out, &run_query(retriever, q, k), json)?;
    }
    Ok(())
}

pub fn chunk_counts(settings: &Settings, source: &dyn DocumentSource) -> Result<Vec<ChunkCount>> {
    let chunker = Chunker::from_config(&settings.retrieval)?;
    let documents = source.documents()?;
    Ok(documents
        .iter()
        .map(|d| ChunkCount { source: d.id.clone(), chars: d.text.chars().count(), chunks: chunker.spans(&d.text).len() })
        .collect())
}

pub fn chunk(settings: &Settings, docs: Option<PathBuf>, limit: Option<usize>, json: bool) -> Result<()> {
    let source = document_source(settings, docs, limit);
    let counts = chunk_counts(settings, &source).with_context(|| format!("reading {}", source.root().display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }
    for c in &counts {
        println!("{:<40} {:>8} chars {:>5} chunks", c.source, c.chars, c.chunks);
    }
    println!("Total chunks created: {}", counts.iter().map(|c| c.chunks).sum::<usize>());
    Ok(())
}

pub fn compare_sentences(settings: &Settings, sentences: Vec<String>) -> Result<Comparison> {
    let sentences = if sentences.is_empty() {
        SAMPLE_SENTENCES.iter().map(|s| s.to_string()).collect()
    } else {
        sentences
    };
    ensure!(sentences.len() >= 2, "compare needs at least two sentences");

    let provider = provider_from_config(&settings.embedding).context("creating embedding provider")?;
    let step = provider.max_batch().unwrap_or(sentences.len()).max(1);
    let mut vectors = Vec::with_capacity(sentences.len());
    for batch in sentences.chunks(step) {
        vectors.extend(provider.embed_batch(batch)?);
    }
    let pairs = similarity_matrix(&vectors)?;
    let best = most_similar_pair(&vectors)?;
    Ok(Comparison { sentences, pairs, best })
}

pub fn compare(settings: &Settings, sentences: Vec<String>, json: bool) -> Result<()> {
    let cmp = compare_sentences(settings, sentences)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&cmp)?);
        return Ok(());
    }
    println!("\nSimilarity Scores:\n");
    for p in &cmp.pairs {
        println!("{}  <->  {}  = {:.4}", cmp.sentences[p.first], cmp.sentences[p.second], p.score);
    }
    if let Some(best) = cmp.best {
        println!("\nMost Similar Sentences:");
        println!("({:?}, {:?}) Score: {:.4}", cmp.sentences[best.first], cmp.sentences[best.second], best.score);
    }
    Ok(())
}

fn write_report(out: &mut dyn Write, report: &QueryReport, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(report)?)?;
        return Ok(());
    }
    if let Some(err) = &report.error {
        eprintln!("Query failed: {}", err);
        return Ok(());
    }
    writeln!(out, "\nTop Results:\n")?;
    if report.results.is_empty() {
        writeln!(out, "(no results)")?;
    }
    for r in &report.results {
        writeln!(out, "Rank {}", r.rank)?;
        writeln!(out, "Source File : {}", r.source)?;
        writeln!(out, "Similarity Score : {:.4}", r.score)?;
        writeln!(out, "Chunk Text : {}", r.text)?;
        writeln!(out, "{}", "-".repeat(60))?;
    }
    Ok(())
}
