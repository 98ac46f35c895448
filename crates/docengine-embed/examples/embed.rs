use docengine_core::config::Config;
use docengine_embed::provider_from_config;

fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let provider = provider_from_config(&settings.embedding)?;
    let texts = vec!["hello world".to_string(), "rust embeddings".to_string()];
    let embs = provider.embed_batch(&texts)?;
    println!("{}: B={} dim={}", provider.embedder_id(), embs.len(), provider.dim());
    Ok(())
}
