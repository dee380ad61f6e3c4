//! Query-time retrieval contract over an [`Index`].

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{Index, ScoredChunk};
use std::time::Duration;
use tracing::{debug, instrument};

/// Retrieves the top-k chunks for a question.
#[derive(Debug, Clone, Copy)]
pub struct Retriever {
    k: usize,
    embed_timeout: Duration,
}

impl Retriever {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            embed_timeout: Duration::from_secs(120),
        }
    }

    /// Set the timeout for embedding the question.
    pub fn with_embed_timeout(mut self, embed_timeout: Duration) -> Self {
        self.embed_timeout = embed_timeout;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    #[instrument(skip(self, index, embedder), fields(k = self.k))]
    pub async fn retrieve(
        &self,
        index: &Index,
        embedder: &dyn Embedder,
        question: &str,
    ) -> Result<Vec<ScoredChunk>> {
        let results = index
            .query(question, embedder, self.k, self.embed_timeout)
            .await?;
        debug!(
            "Retrieved {} chunks (best score {:.3})",
            results.len(),
            results.first().map(|r| r.score).unwrap_or(0.0)
        );
        Ok(results)
    }
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new(4)
    }
}
