//! Page text extraction.
//!
//! Turns a source document into `(page_number, page_text)` pairs.
//! PDFs are read page by page with `lopdf`; plain text and markdown
//! are split into pages on form feed (`\x0c`), which is what
//! `pdftotext` emits between pages.

use std::fs;
use std::path::Path;

use crate::core::error::{CourseAlignError, Result};
use crate::core::types::PageText;

const FORM_FEED: char = '\x0c';

/// Source format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    /// Detect format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "txt" | "text" | "md" | "markdown" => Some(DocumentFormat::Text),
            _ => None,
        }
    }
}

/// A document held in memory, ready for extraction
#[derive(Debug, Clone)]
pub struct Document {
    /// Display name (usually the file name)
    pub name: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            format,
            bytes,
        }
    }

    /// Build a text document from in-memory pages
    pub fn from_pages<S: AsRef<str>>(name: impl Into<String>, pages: &[S]) -> Self {
        let joined = pages
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(&FORM_FEED.to_string());
        Self::new(name, DocumentFormat::Text, joined.into_bytes())
    }

    /// Read a document from disk, choosing the format by extension
    ///
    /// Fails with `Extraction` for missing files, unsupported
    /// extensions, and files over `max_size_mb`.
    pub fn from_path(path: &Path, max_size_mb: usize) -> Result<Self> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentFormat::from_extension)
            .ok_or_else(|| {
                CourseAlignError::Extraction(format!(
                    "Unsupported document type: {} (expected .pdf, .txt or .md)",
                    path.display()
                ))
            })?;

        let metadata = fs::metadata(path).map_err(|e| {
            CourseAlignError::Extraction(format!("Cannot read {}: {e}", path.display()))
        })?;

        let max_bytes = (max_size_mb as u64).saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(CourseAlignError::Extraction(format!(
                "{} is {} bytes, over the {} MB limit",
                path.display(),
                metadata.len(),
                max_size_mb
            )));
        }

        let bytes = fs::read(path).map_err(|e| {
            CourseAlignError::Extraction(format!("Cannot read {}: {e}", path.display()))
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, format, bytes))
    }
}

/// Produces page text for one document format
pub trait PageExtractor {
    /// Extract every page in order; pages may be empty strings
    fn extract_pages(&self, document: &Document) -> Result<Vec<PageText>>;
}

/// PDF extraction via `lopdf`
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PageExtractor for PdfExtractor {
    fn extract_pages(&self, document: &Document) -> Result<Vec<PageText>> {
        let pdf = lopdf::Document::load_mem(&document.bytes).map_err(|e| {
            CourseAlignError::Extraction(format!("{} is not a readable PDF: {e}", document.name))
        })?;

        if pdf.is_encrypted() {
            return Err(CourseAlignError::Extraction(format!(
                "{} is encrypted",
                document.name
            )));
        }

        let mut pages = Vec::new();
        for (page_number, _) in pdf.get_pages() {
            let text = match pdf.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(
                        "No text extracted from page {} of {}: {}",
                        page_number,
                        document.name,
                        e
                    );
                    String::new()
                }
            };
            pages.push(PageText::new(page_number, text));
        }

        Ok(pages)
    }
}

/// Plain text / markdown extraction, pages split on form feed
#[derive(Debug, Default, Clone, Copy)]
pub struct TextExtractor;

impl PageExtractor for TextExtractor {
    fn extract_pages(&self, document: &Document) -> Result<Vec<PageText>> {
        let text = std::str::from_utf8(&document.bytes).map_err(|e| {
            CourseAlignError::Extraction(format!("{} is not valid UTF-8: {e}", document.name))
        })?;

        Ok(text
            .split(FORM_FEED)
            .enumerate()
            .map(|(i, page)| PageText::new(i as u32 + 1, page))
            .collect())
    }
}

/// Extract pages with the extractor matching the document's format
///
/// Fails with `Extraction` when no page has any extractable text.
pub fn extract(document: &Document) -> Result<Vec<PageText>> {
    let pages = match document.format {
        DocumentFormat::Pdf => PdfExtractor.extract_pages(document)?,
        DocumentFormat::Text => TextExtractor.extract_pages(document)?,
    };

    if pages.iter().all(|p| p.text.trim().is_empty()) {
        return Err(CourseAlignError::Extraction(format!(
            "{} has no extractable text on any of its {} pages",
            document.name,
            pages.len()
        )));
    }

    tracing::debug!("Extracted {} pages from {}", pages.len(), document.name);
    Ok(pages)
}
