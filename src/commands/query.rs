//! `query` and `ask` commands: retrieval and full RAG answers

use anyhow::Result;

use crate::chat::ChatEngine;
use crate::config::Config;
use crate::gemini::{GeminiClient, GenerationConfig};
use crate::rag::{Embedder, Retriever, VectorStore};

async fn build_retriever(config: &Config, local_embeddings: bool) -> Result<Retriever> {
    let embedder = if local_embeddings {
        Embedder::local(crate::rag::embeddings::LOCAL_EMBEDDING_DIM)
    } else {
        Embedder::from_env()
    };

    let store = VectorStore::new(&config.qdrant_url, &config.collection, embedder.dimension())
        .await?;

    Ok(Retriever::new(store, embedder))
}

/// Retrieval only: print the nearest chunks for a query.
pub async fn run(
    config: &Config,
    query: &str,
    limit: usize,
    local_embeddings: bool,
) -> Result<()> {
    let retriever = build_retriever(config, local_embeddings).await?;
    let results = retriever.retrieve(query, limit).await?;

    println!("\n=== Results for '{}' ===\n", query);

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    for (idx, doc) in results.iter().enumerate() {
        println!("{}. [score: {:.3}] {}", idx + 1, doc.score, doc.source);
        println!("   {}", truncate(&doc.text.replace('\n', " "), 240));
        println!();
    }

    Ok(())
}

/// Full RAG answer: retrieve context and generate with Gemini.
pub async fn ask(
    config: &Config,
    question: &str,
    limit: Option<usize>,
    local_embeddings: bool,
) -> Result<()> {
    let retriever = build_retriever(config, local_embeddings).await?;

    let gemini = GeminiClient::from_env()?
        .with_model(&config.gemini_model)
        .with_generation_config(GenerationConfig {
            temperature: config.gemini_temperature,
            max_output_tokens: config.gemini_max_output_tokens,
            ..GenerationConfig::default()
        });

    let engine = ChatEngine::new(gemini, retriever, limit.unwrap_or(config.top_k));
    let answer = engine.answer(question).await?;

    println!("\n{}\n", answer.text);

    if !answer.sources.is_empty() {
        println!("Sources: {}", answer.sources.join(", "));
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
