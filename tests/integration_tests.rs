//! Integration tests for the pipila library
//!
//! These tests verify the public API and module interactions.

use std::io::Write;
use std::path::Path;

use pipila::chat::{build_context_prompt, CONTEXT_SEPARATOR};
use pipila::config::{
    Config, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_COLLECTION, DEFAULT_TOP_K,
    MIN_DOCUMENT_CHARS,
};
use pipila::downloader::extract_archive;
use pipila::error::{Error, Result};
use pipila::prompts::{list_prompts, Prompt};
use pipila::rag::chunker::{Chunk, Chunker};
use pipila::rag::extract::{docx_xml_to_text, extract_text, DocumentFormat};
use pipila::rag::retriever::ContextDoc;

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_new_loads_or_defaults() {
    let config = Config::new();
    assert!(!config.collection.is_empty());
    assert!(!config.documents_dir.is_empty());
    assert!(config.chunk_size > config.chunk_overlap);
}

#[test]
fn test_config_default_constants() {
    assert_eq!(DEFAULT_CHUNK_SIZE, 1000);
    assert_eq!(DEFAULT_CHUNK_OVERLAP, 200);
    assert_eq!(DEFAULT_TOP_K, 5);
    assert_eq!(MIN_DOCUMENT_CHARS, 100);
    assert_eq!(DEFAULT_COLLECTION, "pipila_documents");
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_error_variants_display() {
    let errors = vec![
        Error::UnsupportedFormat("file.bin".into()),
        Error::Extraction("broken file".into()),
        Error::Archive("bad zip".into()),
        Error::GeminiError("rate limit".into()),
        Error::IngestLocked,
        Error::LockError("lock failed".into()),
        Error::SerializationError("json error".into()),
        Error::InvalidArgument("bad arg".into()),
    ];

    for err in errors {
        let msg = err.to_string();
        assert!(!msg.is_empty(), "Error message should not be empty");
    }
}

#[test]
fn test_result_type_alias() {
    fn returns_ok() -> Result<i32> {
        Ok(42)
    }

    fn returns_err() -> Result<i32> {
        Err(Error::InvalidArgument("test".into()))
    }

    assert!(returns_ok().is_ok());
    assert!(returns_err().is_err());
}

// ============================================================================
// Chunker Tests
// ============================================================================

#[test]
fn test_chunker_default_parameters() {
    let chunker = Chunker::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP);
    let text = "palabra ".repeat(400); // 3200 chars
    let chunks = chunker.chunk(&text, "fondos.pdf");

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.text.chars().count() <= DEFAULT_CHUNK_SIZE);
        assert_eq!(chunk.source, "fondos.pdf");
    }
}

#[test]
fn test_chunk_ids_are_unique_across_documents() {
    let chunker = Chunker::new(50, 10);
    let a = chunker.chunk(&"a".repeat(200), "a.txt");
    let b = chunker.chunk(&"b".repeat(200), "b.txt");

    let mut ids: Vec<_> = a.iter().chain(b.iter()).map(|c| c.id).collect();
    let before = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), before);
}

#[test]
fn test_chunk_construction() {
    let chunk = Chunk::new("text".into(), 2, 100, 104, "doc.pdf");
    assert_eq!(chunk.index, 2);
    assert_eq!(chunk.start, 100);
    assert_eq!(chunk.end, 104);
}

// ============================================================================
// Extraction Tests
// ============================================================================

#[test]
fn test_extract_text_from_txt_file() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    write!(file, "Terms of the Generali pension product.").unwrap();

    let text = extract_text(file.path()).unwrap();
    assert!(text.contains("Generali"));
}

#[test]
fn test_extract_rejects_unknown_extension() {
    assert!(matches!(
        extract_text(Path::new("spreadsheet.xlsx")),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_document_format_detection() {
    assert_eq!(
        DocumentFormat::from_path(Path::new("a.pdf")),
        Some(DocumentFormat::Pdf)
    );
    assert_eq!(
        DocumentFormat::from_path(Path::new("a.docx")),
        Some(DocumentFormat::Docx)
    );
    assert_eq!(DocumentFormat::from_path(Path::new("a.png")), None);
}

#[test]
fn test_docx_xml_flattening() {
    let xml = "<w:p><w:t>One</w:t></w:p><w:p><w:t>Two</w:t></w:p>";
    assert_eq!(docx_xml_to_text(xml), "One\nTwo");
}

// ============================================================================
// Prompt Tests
// ============================================================================

#[test]
fn test_prompt_files_exist_in_repo() {
    for prompt in list_prompts() {
        let loaded = prompt.load();
        assert!(
            loaded.is_ok(),
            "Prompt file {} should exist",
            prompt.filename()
        );
        assert!(!loaded.unwrap().is_empty());
    }
}

#[test]
fn test_prompt_filenames_are_stable() {
    assert_eq!(Prompt::Assistant.filename(), "assistant.md");
    assert_eq!(Prompt::NoContext.filename(), "no_context.md");
}

// ============================================================================
// Prompt Assembly Tests
// ============================================================================

#[test]
fn test_context_prompt_contains_everything() {
    let docs = vec![
        ContextDoc {
            text: "Advocard covers legal disputes.".into(),
            source: "advocard.pdf".into(),
            score: 0.91,
        },
        ContextDoc {
            text: "Badenia offers building savings.".into(),
            source: "badenia.docx".into(),
            score: 0.84,
        },
    ];

    let prompt = build_context_prompt(&docs, "What does Advocard cover?");

    assert!(prompt.contains("[advocard.pdf]"));
    assert!(prompt.contains("[badenia.docx]"));
    assert!(prompt.contains(CONTEXT_SEPARATOR));
    assert!(prompt.contains("What does Advocard cover?"));
}

// ============================================================================
// Archive Tests
// ============================================================================

#[test]
fn test_extract_archive_roundtrip() {
    let archive_file = tempfile::NamedTempFile::new().unwrap();
    {
        let mut writer = zip::ZipWriter::new(archive_file.reopen().unwrap());
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("productos/dvag.txt", options).unwrap();
        writer.write_all(b"DVAG product overview").unwrap();
        writer.finish().unwrap();
    }

    let output = tempfile::tempdir().unwrap();
    let count = extract_archive(archive_file.path(), output.path()).unwrap();

    assert_eq!(count, 1);
    let extracted = std::fs::read_to_string(output.path().join("productos/dvag.txt")).unwrap();
    assert_eq!(extracted, "DVAG product overview");
}
