//! Document Parser: turns an uploaded PDF/DOC/DOCX into normalized plain text.

use std::path::Path;

use docx_rs::{
    DocumentChild, InsertChild, Paragraph, ParagraphChild, Run, RunChild, StructuredDataTag,
    StructuredDataTagChild, Table, TableCellContent, TableChild, TableRowChild,
};
use thiserror::Error;
use tracing::warn;

use crate::models::resume::ResumeMetadata;

/// Minimum number of characters a usable resume must contain.
pub const MIN_TEXT_CHARS: usize = 100;

/// Approximate characters per page for formats without a page tree.
const CHARS_PER_PAGE: usize = 3000;

/// Words that show up in almost every resume. Their absence is suspicious but not fatal.
const RESUME_KEYWORDS: &[&str] = &[
    "experience",
    "education",
    "skills",
    "work",
    "university",
    "degree",
    "email",
    "phone",
];

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("File parsing failed: Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File parsing failed: PDF parsing failed: {0}")]
    Pdf(String),

    #[error("File parsing failed: DOCX parsing failed: {0}")]
    Docx(String),

    #[error("File parsing failed: DOC parsing failed: {0}. Consider converting to DOCX format.")]
    Doc(String),

    #[error("Extracted text is too short. The resume might be empty or parsing failed.")]
    TooShort,
}

/// The accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Doc,
    Docx,
}

impl DocumentKind {
    /// Detects the kind from a filename's extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Option<Self> {
        match extension_of(filename).as_str() {
            ".pdf" => Some(DocumentKind::Pdf),
            ".doc" => Some(DocumentKind::Doc),
            ".docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => ".pdf",
            DocumentKind::Doc => ".doc",
            DocumentKind::Docx => ".docx",
        }
    }
}

/// Lowercased extension with its leading dot, or an empty string.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Whitespace-normalized text.
    pub text: String,
    pub metadata: ResumeMetadata,
}

/// Outcome of the post-extraction sanity check.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCheck {
    pub has_resume_keywords: bool,
}

/// Extracts text from an uploaded document.
///
/// Carried in `AppState` as `Arc<dyn DocumentParser>`. Implementations are
/// synchronous and CPU-bound; callers run them on the blocking pool.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument, ParseError>;
}

/// Default parser: dispatches by extension to the PDF or DOCX extractor.
pub struct FileParser;

struct RawText {
    text: String,
    page_count: i32,
}

impl DocumentParser for FileParser {
    fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument, ParseError> {
        let kind = DocumentKind::from_filename(filename)
            .ok_or_else(|| ParseError::UnsupportedType(extension_of(filename)))?;

        let raw = match kind {
            DocumentKind::Pdf => extract_pdf(data)?,
            DocumentKind::Docx => extract_docx(data).map_err(ParseError::Docx)?,
            // Legacy .doc only works when the file is really OOXML under the old name.
            DocumentKind::Doc => extract_docx(data).map_err(ParseError::Doc)?,
        };

        Ok(ParsedDocument {
            text: normalize_text(&raw.text),
            metadata: ResumeMetadata {
                file_size: data.len() as i64,
                file_type: kind.extension().to_string(),
                page_count: raw.page_count,
            },
        })
    }
}

fn extract_pdf(data: &[u8]) -> Result<RawText, ParseError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data))
        .map_err(|_| ParseError::Pdf("extractor aborted on malformed input".to_string()))?
        .map_err(|e| ParseError::Pdf(e.to_string()))?;

    let page_count = lopdf::Document::load_mem(data)
        .map(|doc| doc.get_pages().len() as i32)
        .unwrap_or(1);

    Ok(RawText { text, page_count })
}

fn extract_docx(data: &[u8]) -> Result<RawText, String> {
    let docx = docx_rs::read_docx(data).map_err(|e| e.to_string())?;

    let mut text = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => push_paragraph(p, &mut text),
            DocumentChild::Table(t) => push_table(t, &mut text),
            DocumentChild::StructuredDataTag(tag) => push_content_control(tag, &mut text),
            _ => {}
        }
    }

    let page_count = text.chars().count().div_ceil(CHARS_PER_PAGE) as i32;
    Ok(RawText { text, page_count })
}

fn push_run(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

/// Runs can sit inside hyperlinks, tracked insertions, and inline content controls.
fn push_inline(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(run, out),
            ParagraphChild::Hyperlink(link) => push_inline(&link.children, out),
            ParagraphChild::Insert(insert) => {
                for inserted in &insert.children {
                    if let InsertChild::Run(run) = inserted {
                        push_run(run, out);
                    }
                }
            }
            ParagraphChild::StructuredDataTag(tag) => push_content_control(tag, out),
            _ => {}
        }
    }
}

fn push_paragraph(paragraph: &Paragraph, out: &mut String) {
    push_inline(&paragraph.children, out);
    out.push('\n');
}

/// Word templates often wrap whole sections in content controls (`w:sdt`).
fn push_content_control(tag: &StructuredDataTag, out: &mut String) {
    for child in &tag.children {
        match child {
            StructuredDataTagChild::Run(run) => push_run(run, out),
            StructuredDataTagChild::Paragraph(p) => push_paragraph(p, out),
            StructuredDataTagChild::Table(t) => push_table(t, out),
            StructuredDataTagChild::StructuredDataTag(inner) => push_content_control(inner, out),
            _ => {}
        }
    }
}

#[allow(irrefutable_let_patterns)]
fn push_table(table: &Table, out: &mut String) {
    for row in &table.rows {
        if let TableChild::TableRow(row) = row {
            for cell in &row.cells {
                if let TableRowChild::TableCell(cell) = cell {
                    for content in &cell.children {
                        match content {
                            TableCellContent::Paragraph(p) => push_paragraph(p, out),
                            TableCellContent::Table(t) => push_table(t, out),
                            _ => {}
                        }
                    }
                }
            }
        }
    }
}

/// Collapses every whitespace run to a single space and trims the ends.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rejects text too short to be a resume. A missing-keywords result is only
/// logged; it never fails the upload.
pub fn validate_extracted_text(text: &str) -> Result<TextCheck, ParseError> {
    if text.trim().chars().count() < MIN_TEXT_CHARS {
        return Err(ParseError::TooShort);
    }

    let lower = text.to_lowercase();
    let has_resume_keywords = RESUME_KEYWORDS.iter().any(|k| lower.contains(k));
    if !has_resume_keywords {
        warn!("Resume might not contain standard sections");
    }

    Ok(TextCheck {
        has_resume_keywords,
    })
}
