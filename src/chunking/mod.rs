//! Content chunking for breaking document pages into searchable segments.

mod recursive;

pub use recursive::RecursiveChunker;

use crate::config::ChunkingSettings;
use crate::document::Page;
use crate::error::{PagewiseError, Result};
use serde::{Deserialize, Serialize};

/// A bounded slice of document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// 1-based page the text came from.
    pub source_page: u32,
    /// Position of this chunk in the document, starting at 0.
    pub ordinal: usize,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source_page: u32, ordinal: usize) -> Self {
        Self {
            text: text.into(),
            source_page,
            ordinal,
        }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between adjacent chunks of the same page.
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    /// Create a validated configuration.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(PagewiseError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(PagewiseError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl TryFrom<&ChunkingSettings> for ChunkingConfig {
    type Error = PagewiseError;

    fn try_from(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }
}

/// Trait for content chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split document pages into chunks. Empty or whitespace-only input yields no chunks.
    fn chunk(&self, pages: &[Page]) -> Vec<Chunk>;
}

/// Chunk a raw string as a single page.
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Vec<Chunk> {
    RecursiveChunker::new(config).chunk(&[Page::new(1, text)])
}
