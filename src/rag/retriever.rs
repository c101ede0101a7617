//! Query-time retrieval of grounding context

use anyhow::Result;
use tracing::debug;

use super::embeddings::Embedder;
use super::store::VectorStore;

/// Context document handed to the chat orchestrator.
#[derive(Debug, Clone)]
pub struct ContextDoc {
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// Nearest-neighbor retriever over the document collection.
pub struct Retriever {
    store: VectorStore,
    embedder: Embedder,
}

impl Retriever {
    pub fn new(store: VectorStore, embedder: Embedder) -> Self {
        Self { store, embedder }
    }

    /// Retrieve the `limit` most similar chunks for a query.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<ContextDoc>> {
        let embedding = self.embedder.embed(query).await?;
        if embedding.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self.store.search(embedding, limit as u64, None).await?;
        debug!("Retrieved {} chunks for query", hits.len());

        Ok(hits
            .into_iter()
            .map(|hit| ContextDoc {
                text: hit.text,
                source: hit.source,
                score: hit.score,
            })
            .collect())
    }

    /// Access the underlying store (stats, maintenance).
    pub fn store(&self) -> &VectorStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_doc_fields() {
        let doc = ContextDoc {
            text: "Chunk text".to_string(),
            source: "fondos.pdf".to_string(),
            score: 0.87,
        };

        assert_eq!(doc.source, "fondos.pdf");
        assert!(doc.score > 0.0);

        let cloned = doc.clone();
        assert_eq!(cloned.text, doc.text);
    }
}
