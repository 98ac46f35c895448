use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docengine_cli::cli::{Cli, Commands};
use docengine_cli::commands;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = commands::load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Search { docs, limit, k, jobs, query } => {
            let args = commands::SearchArgs { docs, limit, k, jobs, queries: query };
            commands::search(&settings, args, cli.json).await
        }
        Commands::Chunk { docs, limit } => commands::chunk(&settings, docs, limit, cli.json),
        Commands::Compare { sentences } => commands::compare(&settings, sentences, cli.json),
    }
}
