//! `stats` command: collection statistics

use anyhow::Result;

use crate::config::Config;
use crate::rag::VectorStore;

/// Print vector collection statistics.
pub async fn run(config: &Config, dimension: usize) -> Result<()> {
    let store = VectorStore::new(&config.qdrant_url, &config.collection, dimension).await?;
    let stats = store.stats().await?;

    println!("\n=== Collection Statistics ===\n");
    println!("Collection: {}", config.collection);
    println!("Points: {}", stats.points_count);
    println!("Dimension: {}", stats.dimension);

    Ok(())
}
