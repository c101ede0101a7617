//! Directory ingestion: walk -> extract -> chunk -> embed -> upsert

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::metrics;

use super::chunker::Chunker;
use super::embeddings::Embedder;
use super::extract::{extract_text, DocumentFormat};
use super::store::{EmbeddedChunk, VectorStore};

/// Ingestion parameters.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub documents_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_document_chars: usize,
    pub batch_size: usize,
}

impl IngestConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            documents_dir: PathBuf::from(&config.documents_dir),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            min_document_chars: config.min_document_chars,
            batch_size: config.batch_size,
        }
    }
}

/// Outcome of an ingest run.
#[derive(Debug, Default, Clone)]
pub struct IngestReport {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub chunks_indexed: usize,
}

/// Walk the documents directory and index every supported file.
///
/// Per-file failures are logged and skipped so one broken PDF cannot abort
/// the whole run.
pub async fn ingest_directory(
    store: &VectorStore,
    embedder: &Embedder,
    config: &IngestConfig,
) -> Result<IngestReport> {
    if !config.documents_dir.exists() {
        warn!(
            "Documents directory {} does not exist",
            config.documents_dir.display()
        );
        return Ok(IngestReport::default());
    }

    let chunker = Chunker::new(config.chunk_size, config.chunk_overlap);
    let mut report = IngestReport::default();

    for entry in WalkDir::new(&config.documents_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();

        if DocumentFormat::from_path(path).is_none() {
            debug!("Skipping unsupported file {}", path.display());
            continue;
        }

        match ingest_file(store, embedder, &chunker, config, path).await {
            Ok(0) => {
                report.files_skipped += 1;
            }
            Ok(chunks) => {
                report.files_indexed += 1;
                report.chunks_indexed += chunks;
                info!(
                    "Indexed {} ({} chunks)",
                    file_name(path),
                    chunks
                );
            }
            Err(err) => {
                warn!("Failed to index {}: {:#}", path.display(), err);
                report.files_skipped += 1;
            }
        }
    }

    info!(
        "Ingest finished: {} files indexed, {} skipped, {} chunks",
        report.files_indexed, report.files_skipped, report.chunks_indexed
    );
    metrics::record_indexed(report.files_indexed, report.chunks_indexed);

    Ok(report)
}

/// Index a single document. Returns the number of chunks upserted.
async fn ingest_file(
    store: &VectorStore,
    embedder: &Embedder,
    chunker: &Chunker,
    config: &IngestConfig,
    path: &Path,
) -> Result<usize> {
    let source = file_name(path);

    let text = extract_text(path).with_context(|| format!("extracting {}", path.display()))?;

    if text.chars().count() < config.min_document_chars {
        debug!("Skipping {} (too short)", source);
        return Ok(0);
    }

    // Drop stale chunks so re-ingesting a changed file cannot leave orphans.
    store
        .delete_by_source(&source)
        .await
        .with_context(|| format!("clearing old chunks for {}", source))?;

    let chunks = chunker.chunk(&text, source.as_str());
    let path_str = path.display().to_string();
    let batch_size = config.batch_size.max(1);
    let mut indexed = 0;

    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder
            .embed_batch(&texts)
            .await
            .with_context(|| format!("embedding {}", source))?;

        let embedded: Vec<EmbeddedChunk> = batch
            .iter()
            .zip(embeddings)
            .filter(|(_, embedding)| !embedding.is_empty())
            .map(|(chunk, embedding)| EmbeddedChunk {
                chunk: chunk.clone(),
                embedding,
            })
            .collect();

        indexed += store
            .upsert_chunks(&embedded, &path_str)
            .await
            .with_context(|| format!("upserting {}", source))?;
    }

    Ok(indexed)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_config_from_config_copies_values() {
        let config = Config::default();
        let ingest = IngestConfig::from_config(&config);

        assert_eq!(ingest.chunk_size, config.chunk_size);
        assert_eq!(ingest.chunk_overlap, config.chunk_overlap);
        assert_eq!(ingest.min_document_chars, config.min_document_chars);
        assert_eq!(ingest.batch_size, config.batch_size);
        assert_eq!(
            ingest.documents_dir,
            PathBuf::from(&config.documents_dir)
        );
    }

    #[test]
    fn report_default_is_empty() {
        let report = IngestReport::default();
        assert_eq!(report.files_indexed, 0);
        assert_eq!(report.files_skipped, 0);
        assert_eq!(report.chunks_indexed, 0);
    }

    #[test]
    fn file_name_extracts_basename() {
        assert_eq!(file_name(Path::new("documents/dvag/fondos.pdf")), "fondos.pdf");
        assert_eq!(file_name(Path::new("terms.docx")), "terms.docx");
    }

    #[tokio::test]
    async fn missing_directory_returns_empty_report() {
        let store = match VectorStore::new("http://localhost:6333", "pipila_test_missing", 8).await
        {
            Ok(store) => store,
            // Client construction should not require a live server; if it
            // ever does, there is nothing to assert here.
            Err(_) => return,
        };
        let embedder = Embedder::local(8);
        let config = IngestConfig {
            documents_dir: PathBuf::from("/nonexistent/pipila_docs_12345"),
            chunk_size: 100,
            chunk_overlap: 10,
            min_document_chars: 10,
            batch_size: 4,
        };

        let report = ingest_directory(&store, &embedder, &config).await.unwrap();
        assert_eq!(report.files_indexed, 0);
        assert_eq!(report.chunks_indexed, 0);
    }
}
