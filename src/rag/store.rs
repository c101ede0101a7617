//! Vector index backed by Qdrant

use anyhow::Result;
use chrono::{DateTime, Utc};
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, FieldCondition, Filter, Match,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use tracing::{debug, info};

use super::chunker::Chunk;

/// Chunk paired with its embedding, ready for upsert.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Search hit hydrated from the point payload.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub text: String,
    pub source: String,
    pub path: String,
    pub chunk_index: usize,
    pub indexed_at: Option<DateTime<Utc>>,
    pub score: f32,
}

/// Collection statistics
#[derive(Debug)]
pub struct CollectionStats {
    pub points_count: u64,
    pub dimension: usize,
}

/// Vector store for document chunks
pub struct VectorStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl VectorStore {
    /// Connect to a Qdrant server
    pub async fn new(url: &str, collection: impl Into<String>, dimension: usize) -> Result<Self> {
        let client = Qdrant::from_url(url).build()?;

        Ok(Self {
            client,
            collection: collection.into(),
            dimension,
        })
    }

    /// Initialize the collection if it doesn't exist
    pub async fn init_collection(&self) -> Result<()> {
        let collections = self.client.list_collections().await?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            info!("Creating collection '{}'", self.collection);

            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await?;

            info!("Collection created successfully");
        } else {
            debug!("Collection '{}' already exists", self.collection);
        }

        Ok(())
    }

    /// Upsert embedded chunks into the collection
    pub async fn upsert_chunks(&self, chunks: &[EmbeddedChunk], path: &str) -> Result<usize> {
        let indexed_at = Utc::now().to_rfc3339();

        let points: Vec<PointStruct> = chunks
            .iter()
            .filter(|entry| !entry.embedding.is_empty())
            .map(|entry| {
                let mut payload: HashMap<String, QdrantValue> = HashMap::new();
                payload.insert("source".into(), entry.chunk.source.clone().into());
                payload.insert("chunk".into(), (entry.chunk.index as i64).into());
                payload.insert("path".into(), path.to_string().into());
                payload.insert("text".into(), entry.chunk.text.clone().into());
                payload.insert("indexed_at".into(), indexed_at.clone().into());

                PointStruct::new(
                    entry.chunk.id.to_string(),
                    entry.embedding.clone(),
                    payload,
                )
            })
            .collect();

        if points.is_empty() {
            return Ok(0);
        }

        let count = points.len();
        debug!("Upserting {} points to Qdrant", count);

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
            .await?;

        Ok(count)
    }

    /// Search for the nearest chunks, optionally restricted to one source
    pub async fn search(
        &self,
        query_embedding: Vec<f32>,
        limit: u64,
        source: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let mut search_builder =
            SearchPointsBuilder::new(&self.collection, query_embedding, limit).with_payload(true);

        if let Some(source) = source {
            search_builder = search_builder.filter(source_filter(source));
        }

        let results = self.client.search_points(search_builder).await?;

        let hits: Vec<ScoredChunk> = results
            .result
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload;
                let score = point.score;

                Some(ScoredChunk {
                    text: payload.get("text")?.as_str()?.to_string(),
                    source: payload.get("source")?.as_str()?.to_string(),
                    path: payload
                        .get("path")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                    chunk_index: payload
                        .get("chunk")
                        .and_then(|v| v.as_integer())
                        .unwrap_or(0) as usize,
                    indexed_at: payload
                        .get("indexed_at")
                        .and_then(|v| v.as_str())
                        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                        .map(|dt| dt.with_timezone(&Utc)),
                    score,
                })
            })
            .collect();

        Ok(hits)
    }

    /// Delete all chunks belonging to a source document
    pub async fn delete_by_source(&self, source: &str) -> Result<()> {
        let delete_request =
            DeletePointsBuilder::new(&self.collection).points(source_filter(source));

        self.client.delete_points(delete_request).await?;

        debug!("Deleted points for source '{}'", source);
        Ok(())
    }

    /// Get collection statistics
    pub async fn stats(&self) -> Result<CollectionStats> {
        let info = self.client.collection_info(&self.collection).await?;

        Ok(CollectionStats {
            points_count: info
                .result
                .map(|r| r.points_count.unwrap_or(0))
                .unwrap_or(0),
            dimension: self.dimension,
        })
    }
}

fn source_filter(source: &str) -> Filter {
    Filter::must([FieldCondition {
        key: "source".to_string(),
        r#match: Some(Match {
            match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Keyword(
                source.to_string(),
            )),
        }),
        ..Default::default()
    }
    .into()])
}

trait QdrantValueExt {
    fn as_integer(&self) -> Option<i64>;
    fn as_str(&self) -> Option<&str>;
}

impl QdrantValueExt for QdrantValue {
    fn as_integer(&self) -> Option<i64> {
        match &self.kind {
            Some(qdrant_client::qdrant::value::Kind::IntegerValue(v)) => Some(*v),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match &self.kind {
            Some(qdrant_client::qdrant::value::Kind::StringValue(v)) => Some(v),
            _ => None,
        }
    }
}
