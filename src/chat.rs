//! RAG chat orchestration
//!
//! Retrieves grounding context, assembles the prompt, and calls Gemini.

use anyhow::Result;
use tracing::{debug, info};

use crate::gemini::GeminiClient;
use crate::prompts::Prompt;
use crate::rag::{ContextDoc, Retriever};

/// Separator between context documents in the prompt.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

const DEFAULT_ASSISTANT_PROMPT: &str = "You are a financial advisory assistant. \
Ground every answer in the provided documents and cite them by name \
(\"According to <document>, ...\"). If the documents do not contain the \
answer, say so plainly.";

const DEFAULT_NO_CONTEXT_PROMPT: &str = "You are a financial advisory assistant. \
No matching documents were found for this question; answer briefly from \
general knowledge and say that the document corpus has nothing on the topic.";

/// Answer produced by the engine.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Deduplicated document names the answer was grounded in.
    pub sources: Vec<String>,
}

/// Chat engine combining retrieval and generation.
pub struct ChatEngine {
    gemini: GeminiClient,
    retriever: Retriever,
    top_k: usize,
}

impl ChatEngine {
    pub fn new(gemini: GeminiClient, retriever: Retriever, top_k: usize) -> Self {
        Self {
            gemini,
            retriever,
            top_k: top_k.max(1),
        }
    }

    /// Answer a question, grounded in retrieved context where possible.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let docs = self.retriever.retrieve(question, self.top_k).await?;

        if docs.is_empty() {
            debug!("No context retrieved, answering without grounding");
            let system = Prompt::NoContext
                .load()
                .unwrap_or_else(|_| DEFAULT_NO_CONTEXT_PROMPT.to_string());
            let text = self.gemini.chat_with_system(question, Some(&system)).await?;

            return Ok(Answer {
                text,
                sources: Vec::new(),
            });
        }

        info!("Answering with {} context chunks", docs.len());

        let system = Prompt::Assistant
            .load()
            .unwrap_or_else(|_| DEFAULT_ASSISTANT_PROMPT.to_string());
        let prompt = build_context_prompt(&docs, question);
        let text = self.gemini.chat_with_system(&prompt, Some(&system)).await?;

        Ok(Answer {
            text,
            sources: dedup_sources(&docs),
        })
    }

    /// Access the underlying retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }
}

/// Assemble the grounding prompt from retrieved chunks and the question.
pub fn build_context_prompt(docs: &[ContextDoc], question: &str) -> String {
    let context = docs
        .iter()
        .map(|doc| format!("[{}]\n{}", doc.source, doc.text))
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    format!(
        "Answer the user's question using the documents below.\n\n\
         DOCUMENTS:\n{}\n\n\
         QUESTION:\n{}\n\n\
         Cite documents by name and say clearly when they do not cover the question.",
        context, question
    )
}

fn dedup_sources(docs: &[ContextDoc]) -> Vec<String> {
    let mut sources = Vec::new();
    for doc in docs {
        if !sources.contains(&doc.source) {
            sources.push(doc.source.clone());
        }
    }
    sources
}
