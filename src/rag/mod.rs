//! Document ingestion and retrieval pipeline.
//!
//! extract -> chunk -> embed -> index (Qdrant) -> retrieve

pub mod chunker;
pub mod embeddings;
pub mod extract;
pub mod ingest;
pub mod retriever;
pub mod store;

pub use chunker::{Chunk, Chunker};
pub use embeddings::Embedder;
pub use extract::{extract_text, DocumentFormat};
pub use ingest::{ingest_directory, IngestConfig, IngestReport};
pub use retriever::{ContextDoc, Retriever};
pub use store::{CollectionStats, EmbeddedChunk, ScoredChunk, VectorStore};
