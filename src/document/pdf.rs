//! PDF text extraction.

use super::Page;
use crate::error::{PagewiseError, Result};

/// Extract the text of every page of a PDF.
pub(super) fn extract(bytes: &[u8]) -> Result<Vec<Page>> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| PagewiseError::Extraction(format!("PDF extraction failed: {}", e)))?;

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page::new(i as u32 + 1, text))
        .collect())
}
