//! Document sources: turn uploaded bytes into pages of text.

mod pdf;
mod text;

use crate::error::{PagewiseError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Leading bytes of every PDF file.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Detect the format from the content, falling back to the file name.
    pub fn detect(name: &str, bytes: &[u8]) -> Self {
        if bytes.starts_with(PDF_MAGIC) {
            return DocumentKind::Pdf;
        }

        let is_pdf_name = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf_name {
            DocumentKind::Pdf
        } else {
            DocumentKind::Text
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Text => write!(f, "text"),
        }
    }
}

/// A document handed to the session for indexing.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Display name, usually the file name.
    pub name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
    pub kind: DocumentKind,
}

impl Upload {
    /// Create an upload, detecting its format.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let kind = DocumentKind::detect(&name, &bytes);
        Self { name, bytes, kind }
    }

    /// Read an upload from a local file.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            PagewiseError::Extraction(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }
}

/// Text of a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    pub text: String,
}

impl Page {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Extract pages from an upload.
///
/// PDF parsing is CPU-bound and runs on the blocking pool. A panic inside the
/// parser is reported as an extraction error.
pub async fn extract_pages(upload: &Upload) -> Result<Vec<Page>> {
    let kind = upload.kind;
    let bytes = upload.bytes.clone();

    let pages = tokio::task::spawn_blocking(move || match kind {
        DocumentKind::Pdf => pdf::extract(&bytes),
        DocumentKind::Text => text::extract(&bytes),
    })
    .await
    .map_err(|e| PagewiseError::Extraction(format!("Extractor crashed: {}", e)))??;

    debug!("Extracted {} pages from {}", pages.len(), upload.name);
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(DocumentKind::detect("a.txt", b"%PDF-1.7 ..."), DocumentKind::Pdf);
        assert_eq!(DocumentKind::detect("report.PDF", b"garbage"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::detect("notes.md", b"# Notes"), DocumentKind::Text);
    }

    #[tokio::test]
    async fn test_extract_text_upload() {
        let upload = Upload::new("notes.txt", b"first page\x0csecond page".to_vec());
        let pages = extract_pages(&upload).await.unwrap();
        assert_eq!(pages, vec![Page::new(1, "first page"), Page::new(2, "second page")]);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_extraction_error() {
        let upload = Upload::new("broken.pdf", b"%PDF-1.4 this is not a pdf".to_vec());
        let result = extract_pages(&upload).await;
        assert!(matches!(result, Err(PagewiseError::Extraction(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = Upload::from_path(Path::new("/definitely/not/here.pdf")).await;
        assert!(matches!(result, Err(PagewiseError::Extraction(_))));
    }
}
