//! `ingest` command: index the documents directory into Qdrant

use std::path::PathBuf;

use anyhow::Result;

use crate::config::Config;
use crate::lock::IngestLock;
use crate::rag::{ingest_directory, Embedder, IngestConfig, VectorStore};

/// Index every supported document under the documents directory.
pub async fn run(
    config: &Config,
    dir: Option<PathBuf>,
    batch_size: Option<usize>,
    local_embeddings: bool,
) -> Result<()> {
    // Held for the whole run; dropped (and released) on any early return.
    let _lock = IngestLock::acquire()?;

    let embedder = if local_embeddings {
        Embedder::local(crate::rag::embeddings::LOCAL_EMBEDDING_DIM)
    } else {
        Embedder::from_env()
    };

    let store = VectorStore::new(&config.qdrant_url, &config.collection, embedder.dimension())
        .await?;
    store.init_collection().await?;

    let mut ingest_config = IngestConfig::from_config(config);
    if let Some(dir) = dir {
        ingest_config.documents_dir = dir;
    }
    if let Some(batch) = batch_size {
        ingest_config.batch_size = batch;
    }

    let report = ingest_directory(&store, &embedder, &ingest_config).await?;

    println!(
        "Indexed {} files ({} chunks), skipped {}",
        report.files_indexed, report.chunks_indexed, report.files_skipped
    );

    Ok(())
}
