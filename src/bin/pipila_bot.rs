//! PIPILA Telegram bot
//!
//! Relays plain-text questions to the RAG chat engine and sends the grounded
//! answer back over the Bot API. No command surface: anything that is not a
//! text message (or starts with '/') is ignored.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use dotenvy::dotenv;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, Message};
use tracing::{error, info};

use pipila::chat::ChatEngine;
use pipila::config::TELEGRAM_MESSAGE_LIMIT;
use pipila::gemini::{GeminiClient, GenerationConfig};
use pipila::metrics;
use pipila::rag::{Embedder, Retriever, VectorStore};
use pipila::Config;

const FAILURE_REPLY: &str =
    "Sorry, something went wrong while processing your question. Please try again.";

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    engine: Arc<ChatEngine>,
}

async fn handle_message(bot: Bot, msg: Message, state: AppState) -> Result<()> {
    let text = match msg.text() {
        Some(t) if !t.trim().is_empty() && !t.starts_with('/') => t.trim(),
        _ => return Ok(()),
    };

    info!(chat_id = msg.chat.id.0, "Incoming question");

    metrics::record_command_start("bot_answer");
    let start = Instant::now();

    bot.send_chat_action(msg.chat.id, ChatAction::Typing)
        .await?;

    let result = state.engine.answer(text).await;
    metrics::record_command_result("bot_answer", start.elapsed(), result.is_ok());

    match result {
        Ok(answer) => {
            send_long_message(&bot, msg.chat.id, &answer.text).await?;
        }
        Err(err) => {
            error!(chat_id = msg.chat.id.0, "Failed to answer: {:#}", err);
            bot.send_message(msg.chat.id, FAILURE_REPLY).await?;
        }
    }

    Ok(())
}

/// Send a reply, splitting it when it exceeds the Telegram message limit.
async fn send_long_message(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    for part in split_message(text, TELEGRAM_MESSAGE_LIMIT) {
        bot.send_message(chat_id, part).await?;
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    Ok(())
}

/// Split text into pieces of at most `limit` characters.
fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let chars: Vec<char> = text.chars().collect();

    chars
        .chunks(limit)
        .map(|part| part.iter().collect())
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let token = std::env::var("BOT_TOKEN").context("BOT_TOKEN not set in environment (.env)")?;

    let config = Config::new();

    // Retrieval side: embedder + vector store must agree on the dimension.
    let embedder = Embedder::from_env();
    let store = VectorStore::new(&config.qdrant_url, &config.collection, embedder.dimension())
        .await
        .context("connecting to Qdrant")?;
    store.init_collection().await?;
    let retriever = Retriever::new(store, embedder);

    // Generation side
    let gemini = GeminiClient::from_env()?
        .with_model(&config.gemini_model)
        .with_generation_config(GenerationConfig {
            temperature: config.gemini_temperature,
            max_output_tokens: config.gemini_max_output_tokens,
            ..GenerationConfig::default()
        });

    let state = AppState {
        engine: Arc::new(ChatEngine::new(gemini, retriever, config.top_k)),
    };

    if let Ok(addr) = std::env::var("METRICS_ADDR") {
        match addr.parse() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => error!(%addr, "Invalid metrics address: {}", err),
        }
    }

    info!("Starting PIPILA bot (model: {})", config.gemini_model);

    let bot = Bot::new(token);

    Dispatcher::builder(
        bot,
        Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
            let state = state.clone();
            async move { handle_message(bot, msg, state).await }
        }),
    )
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}
