//! Document text source: turns an uploaded PDF/DOCX into plain text.
//!
//! Type and size are checked before any parsing. Parsing is CPU-bound and
//! must run inside `tokio::task::spawn_blocking`.

use std::io::{Cursor, Read};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported file format '{0}'. Please upload a PDF or DOCX file.")]
    Unsupported(String),

    #[error("File size must be less than {} MB", .max / (1024 * 1024))]
    TooLarge { size: usize, max: usize },

    #[error("The uploaded file is empty")]
    Empty,

    #[error("Failed to parse PDF file")]
    Pdf(String),

    #[error("Failed to parse DOCX file")]
    Docx(String),

    #[error("No readable text was found in the document")]
    NoText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Resolves the kind from the file extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, DocumentError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            _ => Err(DocumentError::Unsupported(if extension.is_empty() {
                file_name.to_string()
            } else {
                extension
            })),
        }
    }
}

lazy_static! {
    static ref XML_PARAGRAPH_END: Regex = Regex::new(r"</w:p>|<w:br\s*/>|<w:cr\s*/>").unwrap();
    static ref XML_TAB: Regex = Regex::new(r"<w:tab\s*/>").unwrap();
    static ref XML_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// Validates an upload without reading its contents.
pub fn validate_upload(
    file_name: &str,
    size: usize,
    max_bytes: usize,
) -> Result<DocumentKind, DocumentError> {
    let kind = DocumentKind::from_file_name(file_name)?;
    if size == 0 {
        return Err(DocumentError::Empty);
    }
    if size > max_bytes {
        return Err(DocumentError::TooLarge {
            size,
            max: max_bytes,
        });
    }
    Ok(kind)
}

/// Extracts plain text from a validated upload.
pub fn extract_text(
    file_name: &str,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<String, DocumentError> {
    let kind = validate_upload(file_name, bytes.len(), max_bytes)?;

    let text = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| DocumentError::Pdf(e.to_string()))?,
        DocumentKind::Docx => extract_docx_text(bytes)?,
    };

    if text.trim().is_empty() {
        return Err(DocumentError::NoText);
    }
    Ok(text)
}

fn extract_docx_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| DocumentError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| DocumentError::Docx(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| DocumentError::Docx(e.to_string()))?;
    Ok(docx_xml_to_text(&xml))
}

/// Flattens WordprocessingML body XML into newline-separated paragraphs.
fn docx_xml_to_text(xml: &str) -> String {
    let with_breaks = XML_PARAGRAPH_END.replace_all(xml, "\n");
    let with_tabs = XML_TAB.replace_all(&with_breaks, "\t");
    let stripped = XML_TAG.replace_all(&with_tabs, "");
    stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
