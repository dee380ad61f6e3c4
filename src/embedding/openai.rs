//! OpenAI-compatible embeddings implementation.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{PagewiseError, Result};
use crate::openai::classify_error;
use crate::provider::ModelError;
use crate::retry::{with_retry, RetryPolicy};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Embedder backed by an OpenAI-compatible embeddings endpoint.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    model_id: String,
    dimensions: Option<u32>,
    batch_size: usize,
    retry: RetryPolicy,
}

impl OpenAIEmbedder {
    pub fn new(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        settings: &EmbeddingSettings,
        retry: RetryPolicy,
    ) -> Self {
        let model_id = match settings.dimensions {
            Some(dimensions) => format!("{}/{}", settings.model, dimensions),
            None => settings.model.clone(),
        };

        Self {
            client,
            model: settings.model.clone(),
            model_id,
            dimensions: settings.dimensions,
            batch_size: settings.batch_size.max(1),
            retry,
        }
    }

    /// Send one embeddings request.
    async fn request(&self, input: &[String]) -> std::result::Result<Vec<Vec<f32>>, ModelError> {
        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(&self.model)
            .input(EmbeddingInput::StringArray(input.to_vec()));
        if let Some(dimensions) = self.dimensions {
            args.dimensions(dimensions);
        }
        let request = args
            .build()
            .map_err(|e| ModelError::Rejected(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(classify_error)?;

        // Sort by index to ensure correct order
        let mut embeddings: Vec<_> = response.data.into_iter().collect();
        embeddings.sort_by_key(|e| e.index);

        Ok(embeddings.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| PagewiseError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let embeddings = with_retry(self.retry, "Embedding request", || self.request(batch))
                .await
                .map_err(|e| PagewiseError::Embedding(e.to_string()))?;

            if embeddings.len() != batch.len() {
                return Err(PagewiseError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }
            all_embeddings.extend(embeddings);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
