//! PIPILA - Financial Document RAG Pipeline
//!
//! This library provides tools to:
//! - Download a zipped document corpus from an external file host
//! - Extract plain text from PDF, DOCX and TXT documents
//! - Split text into fixed-size overlapping chunks
//! - Embed chunks and index them in a Qdrant collection
//! - Retrieve nearest-neighbor context for a question
//! - Answer questions with Google Gemini grounded in retrieved context
//! - Relay answers over the Telegram Bot API

pub mod chat;
pub mod config;
pub mod downloader;
pub mod error;
pub mod gemini;
pub mod lock;
pub mod metrics;
pub mod prompts;
pub mod rag;

// Re-export common types
pub use chat::{Answer, ChatEngine};
pub use config::Config;
pub use error::{Error, Result};
pub use gemini::GeminiClient;
pub use lock::IngestLock;
pub use prompts::{load_prompt, Prompt};

// Commands module uses re-exported types, so it must be declared after the re-exports
pub mod commands;
