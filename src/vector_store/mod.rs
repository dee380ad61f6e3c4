//! Vector index over document chunks.
//!
//! [`Index`] binds a [`VectorStore`] backend to the embedder that produced its
//! vectors, so it can refuse queries embedded in a different space.

mod memory;

pub use memory::MemoryVectorStore;

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{PagewiseError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// A chunk stored with its embedding.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A search result with score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store entries, returning how many were added.
    async fn insert_batch(&self, entries: Vec<IndexEntry>) -> Result<usize>;

    /// Return up to `limit` entries by descending similarity, ties by ascending ordinal.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of stored entries.
    async fn len(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Searchable index for one document.
pub struct Index {
    id: Uuid,
    document: String,
    embedder_id: String,
    dimensions: usize,
    chunk_count: usize,
    built_at: DateTime<Utc>,
    store: Box<dyn VectorStore>,
}

impl Index {
    /// Embed every chunk once and store it.
    #[instrument(skip(chunks, embedder), fields(chunks = chunks.len(), embedder = embedder.model_id()))]
    pub async fn build(
        document: &str,
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        embed_timeout: Duration,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(PagewiseError::IndexBuild(
                "There are no chunks to index".to_string(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = tokio::time::timeout(embed_timeout, embedder.embed_batch(&texts))
            .await
            .map_err(|_| {
                PagewiseError::IndexBuild(format!(
                    "Embedding timed out after {:?}",
                    embed_timeout
                ))
            })?
            .map_err(|e| PagewiseError::IndexBuild(e.to_string()))?;

        if embeddings.len() != chunks.len() {
            return Err(PagewiseError::IndexBuild(format!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 || embeddings.iter().any(|e| e.len() != dimensions) {
            return Err(PagewiseError::IndexBuild(
                "Embedder returned vectors of inconsistent dimensions".to_string(),
            ));
        }

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        let store = MemoryVectorStore::new();
        let chunk_count = store.insert_batch(entries).await?;

        info!("Indexed {} chunks ({} dimensions)", chunk_count, dimensions);

        Ok(Self {
            id: Uuid::new_v4(),
            document: document.to_string(),
            embedder_id: embedder.model_id().to_string(),
            dimensions,
            chunk_count,
            built_at: Utc::now(),
            store: Box::new(store),
        })
    }

    /// Return the `k` chunks most similar to `query`.
    ///
    /// `embedder` must be the embedder the index was built with.
    pub async fn query(
        &self,
        query: &str,
        embedder: &dyn Embedder,
        k: usize,
        embed_timeout: Duration,
    ) -> Result<Vec<ScoredChunk>> {
        if embedder.model_id() != self.embedder_id {
            return Err(PagewiseError::Guard(format!(
                "Index was built with embedder '{}' but queried with '{}'. Process the document again.",
                self.embedder_id,
                embedder.model_id()
            )));
        }

        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = tokio::time::timeout(embed_timeout, embedder.embed(query))
            .await
            .map_err(|_| {
                PagewiseError::Retrieval(format!(
                    "Query embedding timed out after {:?}",
                    embed_timeout
                ))
            })?
            .map_err(|e| PagewiseError::Retrieval(e.to_string()))?;

        if query_embedding.len() != self.dimensions {
            return Err(PagewiseError::Guard(format!(
                "Query vector has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let results = self.store.search(&query_embedding, k).await?;
        debug!("Query matched {} chunks", results.len());
        Ok(results)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the indexed document.
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.chunk_count
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_count == 0
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("id", &self.id)
            .field("document", &self.document)
            .field("embedder_id", &self.embedder_id)
            .field("chunks", &self.chunk_count)
            .finish()
    }
}
