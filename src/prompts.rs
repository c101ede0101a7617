//! Loader for system prompts stored as files.
//!
//! Prompts live in the `prompts/` directory at the project root.

use std::path::PathBuf;

use crate::{Error, Result};

/// Available prompts.
#[derive(Debug, Clone, Copy)]
pub enum Prompt {
    /// Advisory assistant system instruction.
    Assistant,
    /// Used when retrieval returns nothing relevant.
    NoContext,
}

impl Prompt {
    /// Prompt file name (Markdown).
    pub fn filename(&self) -> &'static str {
        match self {
            Prompt::Assistant => "assistant.md",
            Prompt::NoContext => "no_context.md",
        }
    }

    /// Load the prompt from its file.
    pub fn load(&self) -> Result<String> {
        load_prompt(self.filename())
    }
}

/// Load a prompt by file name.
pub fn load_prompt(filename: &str) -> Result<String> {
    let path = prompts_dir().join(filename);
    std::fs::read_to_string(&path)
        .map(|text| text.trim().to_string())
        .map_err(|e| Error::InvalidArgument(format!("Failed to load prompt {}: {}", filename, e)))
}

/// Path to the prompts directory.
pub fn prompts_dir() -> PathBuf {
    // Look for prompts/ relative to the current or parent directory
    let candidates = [
        PathBuf::from("prompts"),
        PathBuf::from("../prompts"),
        PathBuf::from("../../prompts"),
    ];

    for path in candidates {
        if path.exists() {
            return path;
        }
    }

    // Fallback
    PathBuf::from("prompts")
}

/// List all available prompts.
pub fn list_prompts() -> Vec<Prompt> {
    vec![Prompt::Assistant, Prompt::NoContext]
}
