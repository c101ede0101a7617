//! Plain-text extraction from corpus documents
//!
//! PDF goes through `pdf_extract`; DOCX is an OOXML zip whose
//! `word/document.xml` we flatten to text; TXT/MD are read as-is.

use std::fs;
use std::io::Read;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// Supported document formats, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

impl DocumentFormat {
    /// Detect the format from a file path, `None` for unsupported extensions.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" | "doc" => Some(DocumentFormat::Docx),
            "txt" | "md" => Some(DocumentFormat::Text),
            _ => None,
        }
    }
}

/// Extract plain text from a document, dispatching on the file extension.
pub fn extract_text(path: &Path) -> Result<String> {
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;

    match format {
        DocumentFormat::Pdf => extract_pdf(path),
        DocumentFormat::Docx => extract_docx(path),
        DocumentFormat::Text => extract_txt(path),
    }
}

fn extract_pdf(path: &Path) -> Result<String> {
    // Scanned PDFs with no text layer come back as empty strings, not errors.
    pdf_extract::extract_text(path)
        .map_err(|e| Error::Extraction(format!("{}: {}", path.display(), e)))
}

fn extract_docx(path: &Path) -> Result<String> {
    let file = fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| Error::Extraction(format!("{}: no word/document.xml ({})", path.display(), e)))?
        .read_to_string(&mut xml)?;

    Ok(docx_xml_to_text(&xml))
}

fn extract_txt(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Flatten OOXML body markup to plain text.
///
/// Paragraph ends map to newlines, every other tag is dropped, and the five
/// predefined XML entities are decoded.
pub fn docx_xml_to_text(xml: &str) -> String {
    static PARAGRAPH_END: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"</w:p\s*>").expect("valid paragraph regex"));
    static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

    let text = PARAGRAPH_END.replace_all(xml, "\n");
    let text = TAG.replace_all(&text, "");

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn format_from_path_detects_known_extensions() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/report.pdf")),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("notes.DOCX")),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("legacy.doc")),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("readme.txt")),
            Some(DocumentFormat::Text)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("guide.md")),
            Some(DocumentFormat::Text)
        );
    }

    #[test]
    fn format_from_path_rejects_unknown() {
        assert_eq!(DocumentFormat::from_path(Path::new("sheet.xlsx")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn extract_text_unsupported_extension_errors() {
        let err = extract_text(Path::new("table.csv")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn extract_txt_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Fund prospectus, section one.").unwrap();

        let text = extract_text(file.path()).unwrap();
        assert_eq!(text, "Fund prospectus, section one.");
    }

    #[test]
    fn extract_txt_is_lossy_on_invalid_utf8() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(&[b'o', b'k', 0xff, b'!']).unwrap();

        let text = extract_text(file.path()).unwrap();
        assert!(text.starts_with("ok"));
        assert!(text.ends_with('!'));
    }

    #[test]
    fn extract_missing_file_errors() {
        let err = extract_text(Path::new("/nonexistent/dir/file.pdf")).unwrap_err();
        assert!(matches!(err, Error::Extraction(_) | Error::IoError(_)));
    }

    #[test]
    fn docx_xml_paragraphs_become_newlines() {
        let xml = "<w:document><w:body>\
            <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>\
            <w:p><w:r><w:t>Second paragraph.</w:t></w:r></w:p>\
            </w:body></w:document>";

        let text = docx_xml_to_text(xml);
        assert_eq!(text, "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn docx_xml_decodes_entities() {
        let xml = "<w:p><w:t>Fees &amp; charges &lt; 2% &quot;net&quot;</w:t></w:p>";
        let text = docx_xml_to_text(xml);
        assert_eq!(text, "Fees & charges < 2% \"net\"");
    }

    #[test]
    fn docx_xml_split_runs_keep_text() {
        // Formatting splits a sentence into multiple runs
        let xml = "<w:p><w:r><w:t>Guaranteed </w:t></w:r>\
            <w:r><w:rPr><w:b/></w:rPr><w:t>returns</w:t></w:r>\
            <w:r><w:t> do not exist.</w:t></w:r></w:p>";

        let text = docx_xml_to_text(xml);
        assert_eq!(text, "Guaranteed returns do not exist.");
    }

    #[test]
    fn docx_xml_empty_input() {
        assert_eq!(docx_xml_to_text(""), "");
    }

    #[test]
    fn extract_docx_from_real_container() {
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        {
            let mut writer = zip::ZipWriter::new(file.reopen().unwrap());
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("word/document.xml", options).unwrap();
            writer
                .write_all(b"<w:document><w:body><w:p><w:t>Pension plan terms.</w:t></w:p></w:body></w:document>")
                .unwrap();
            writer.finish().unwrap();
        }

        let text = extract_text(file.path()).unwrap();
        assert_eq!(text, "Pension plan terms.");
    }

    #[test]
    fn extract_docx_without_document_xml_errors() {
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        {
            let mut writer = zip::ZipWriter::new(file.reopen().unwrap());
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("other.xml", options).unwrap();
            writer.write_all(b"<x/>").unwrap();
            writer.finish().unwrap();
        }

        let err = extract_text(file.path()).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
