//! Plain text documents. Form feeds separate pages.

use super::Page;
use crate::error::{PagewiseError, Result};

const PAGE_BREAK: char = '\x0c';

pub(super) fn extract(bytes: &[u8]) -> Result<Vec<Page>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| PagewiseError::Extraction(format!("Document is not valid UTF-8: {}", e)))?;

    Ok(text
        .split(PAGE_BREAK)
        .enumerate()
        .map(|(i, page)| Page::new(i as u32 + 1, page))
        .collect())
}
