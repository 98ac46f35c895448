//! CLI type definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "docengine")]
#[command(about = "Chunk, embed and search a local document folder", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file to use instead of config.toml / config.<env>.toml
    #[arg(short, long, global = true, env = "DOCENGINE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a document folder and answer queries against it
    Search {
        /// Document folder (defaults to data.docs_dir)
        #[arg(short, long)]
        docs: Option<PathBuf>,

        /// Only read the first N documents (in sorted path order)
        #[arg(long)]
        limit: Option<usize>,

        /// Results per query (defaults to retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,

        /// Embed this many batches concurrently while indexing
        #[arg(long)]
        jobs: Option<usize>,

        /// Queries to run; prompts on stdin when none are given
        query: Vec<String>,
    },

    /// Show how each document is split into chunks
    Chunk {
        /// Document folder (defaults to data.docs_dir)
        #[arg(short, long)]
        docs: Option<PathBuf>,

        /// Only read the first N documents (in sorted path order)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Score every pair of sentences and report the closest pair
    Compare {
        /// Sentences to compare; a built-in sample set when omitted
        sentences: Vec<String>,
    },
}
