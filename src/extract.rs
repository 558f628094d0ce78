//! Document loading: PDF text extraction and plain-text files.
//!
//! Extraction never panics on bad input; callers get an [`ExtractError`]
//! and decide how to report it.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

/// Default output file for [`save_extracted_text`].
pub const DEFAULT_EXTRACTED_TEXT_PATH: &str = "extracted_text.txt";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("No text could be extracted; the PDF might be scanned or unreadable")]
    Unreadable,
    #[error("document is not valid UTF-8 text: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Extract plain text from a PDF held in memory.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(ExtractError::Unreadable);
    }
    debug!(chars = text.len(), "extracted PDF text");
    Ok(text)
}

/// Extract text from `bytes` according to `content_type`.
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String, ExtractError> {
    match content_type {
        MIME_PDF => extract_pdf_text(bytes),
        MIME_TEXT => Ok(String::from_utf8(bytes.to_vec())?),
        _ => Err(ExtractError::UnsupportedContentType(
            content_type.to_string(),
        )),
    }
}

/// Content type inferred from the file extension; anything but `.pdf`
/// is read as text.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => MIME_PDF,
        _ => MIME_TEXT,
    }
}

/// Read a document from disk and return its text.
pub fn load_document(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = extract_text(&bytes, content_type_for(path))?;
    info!(path = %path.display(), words = text.split_whitespace().count(), "loaded document");
    Ok(text)
}

/// Write extracted text to `path`.
pub fn save_extracted_text(text: &str, path: &Path) -> Result<(), ExtractError> {
    std::fs::write(path, text).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "saved extracted text");
    Ok(())
}

/// CLI entry point for `docqa extract`.
pub fn run_extract(pdf: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let text = load_document(pdf)?;
    let out = out.unwrap_or_else(|| Path::new(DEFAULT_EXTRACTED_TEXT_PATH));
    save_extracted_text(&text, out)?;
    println!(
        "Extracted {} words from {} to {}",
        text.split_whitespace().count(),
        pdf.display(),
        out.display()
    );
    Ok(())
}
