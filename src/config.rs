//! Configuration for the RAG pipeline and bot
//!
//! Loads configuration from config.yml file

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default constants (fallback if config.yml not found)
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";
pub const DEFAULT_COLLECTION: &str = "pipila_documents";
pub const DEFAULT_DOCUMENTS_DIR: &str = "documents";
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const MIN_DOCUMENT_CHARS: usize = 100;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const INGEST_LOCK_FILE: &str = "pipila_ingest.lock";

/// Telegram hard-caps messages at 4096 chars; we split a little below that.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;

/// YAML config structures
#[derive(Debug, Deserialize)]
struct YamlConfig {
    qdrant: Option<QdrantConfig>,
    rag: Option<RagConfig>,
    gemini: Option<GeminiConfig>,
    corpus: Option<CorpusConfig>,
}

#[derive(Debug, Deserialize)]
struct QdrantConfig {
    url: Option<String>,
    collection: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RagConfig {
    documents_dir: Option<String>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    top_k: Option<usize>,
    min_document_chars: Option<usize>,
    batch_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct GeminiConfig {
    model: Option<String>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CorpusConfig {
    url: Option<String>,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub qdrant_url: String,
    pub collection: String,
    pub documents_dir: String,
    pub corpus_url: Option<String>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub min_document_chars: usize,
    pub batch_size: usize,
    pub gemini_model: String,
    pub gemini_temperature: f32,
    pub gemini_max_output_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load configuration from config.yml or use defaults
    /// Environment variables take precedence over config.yml values
    pub fn new() -> Self {
        Self::load_from_file("config.yml")
            .or_else(|_| Self::load_from_file("../config.yml"))
            .unwrap_or_else(|_| Self::defaults())
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: &str) -> Option<String> {
        // If value from YAML looks like ${...}, try env var
        if let Some(ref v) = value {
            if v.starts_with("${") && v.ends_with('}') {
                // Extract var name from ${VAR_NAME}
                let var_name = &v[2..v.len() - 1];
                if let Ok(env_val) = std::env::var(var_name) {
                    return Some(env_val);
                }
                // Unresolvable placeholder is treated as unset
                return std::env::var(env_key).ok();
            }
        }
        // Also check explicit env_key as fallback
        if let Ok(env_val) = std::env::var(env_key) {
            return Some(env_val);
        }
        value
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let yaml: YamlConfig = serde_yaml::from_str(&content)?;

        let mut config = Self::defaults();

        if let Some(qdrant) = yaml.qdrant {
            if let Some(url) = Self::resolve_env_string(qdrant.url, "QDRANT_URL") {
                config.qdrant_url = url;
            }
            if let Some(collection) = qdrant.collection {
                config.collection = collection;
            }
        }

        if let Some(rag) = yaml.rag {
            if let Some(dir) = Self::resolve_env_string(rag.documents_dir, "DOCUMENTS_DIR") {
                config.documents_dir = dir;
            }
            if let Some(size) = rag.chunk_size {
                config.chunk_size = size;
            }
            if let Some(overlap) = rag.chunk_overlap {
                config.chunk_overlap = overlap;
            }
            if let Some(top_k) = rag.top_k {
                config.top_k = top_k;
            }
            if let Some(min_chars) = rag.min_document_chars {
                config.min_document_chars = min_chars;
            }
            if let Some(batch) = rag.batch_size {
                config.batch_size = batch;
            }
        }

        if let Some(gemini) = yaml.gemini {
            if let Some(model) = Self::resolve_env_string(gemini.model, "GEMINI_MODEL") {
                config.gemini_model = model;
            }
            if let Some(temperature) = gemini.temperature {
                config.gemini_temperature = temperature;
            }
            if let Some(max_tokens) = gemini.max_output_tokens {
                config.gemini_max_output_tokens = max_tokens;
            }
        }

        if let Some(corpus) = yaml.corpus {
            config.corpus_url = Self::resolve_env_string(corpus.url, "CORPUS_URL");
        }

        Ok(config)
    }

    fn defaults() -> Self {
        Self {
            qdrant_url: std::env::var("QDRANT_URL")
                .unwrap_or_else(|_| DEFAULT_QDRANT_URL.to_string()),
            collection: DEFAULT_COLLECTION.to_string(),
            documents_dir: std::env::var("DOCUMENTS_DIR")
                .unwrap_or_else(|_| DEFAULT_DOCUMENTS_DIR.to_string()),
            corpus_url: std::env::var("CORPUS_URL").ok(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            min_document_chars: MIN_DOCUMENT_CHARS,
            batch_size: DEFAULT_BATCH_SIZE,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_temperature: 0.7,
            gemini_max_output_tokens: 2048,
        }
    }
}
