//! OpenAI-compatible API client configuration and error mapping.
//!
//! Works with any endpoint that speaks the OpenAI chat and embeddings protocol.
//! The default endpoint is Google's OpenAI-compatible Gemini API.

use crate::config::{EmbeddingSettings, GenerationSettings, ProviderSettings, Settings};
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::llm::OpenAIChatModel;
use crate::provider::{Connection, Credentials, ModelError, Provider};
use crate::retry::RetryPolicy;
use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::debug;

static AUTH_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(401|403)\b").expect("valid regex"));
static RATE_LIMIT_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b429\b").expect("valid regex"));

/// Create a client for the configured endpoint with a request timeout.
pub fn create_client(
    credentials: &Credentials,
    settings: &ProviderSettings,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .build()?;

    let config = OpenAIConfig::new()
        .with_api_key(credentials.api_key())
        .with_api_base(settings.api_base.trim_end_matches('/'));

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Map a client error onto the provider error kinds.
pub fn classify_error(error: OpenAIError) -> ModelError {
    match error {
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.clone().unwrap_or_default();
            let text = format!("{} {}", kind, api.message).to_lowercase();
            if text.contains("api key")
                || text.contains("api_key")
                || text.contains("unauthenticated")
                || text.contains("permission")
            {
                ModelError::Auth(api.message)
            } else if text.contains("rate limit")
                || text.contains("rate_limit")
                || text.contains("quota")
                || text.contains("resource_exhausted")
            {
                ModelError::RateLimited(api.message)
            } else {
                ModelError::Rejected(api.message)
            }
        }
        OpenAIError::Reqwest(e) => match e.status().map(|s| s.as_u16()) {
            Some(401) | Some(403) => ModelError::Auth(e.to_string()),
            Some(429) => ModelError::RateLimited(e.to_string()),
            _ => ModelError::Transport(e.to_string()),
        },
        OpenAIError::StreamError(message) => {
            if AUTH_STATUS.is_match(&message) {
                ModelError::Auth(message)
            } else if RATE_LIMIT_STATUS.is_match(&message) {
                ModelError::RateLimited(message)
            } else {
                ModelError::Transport(message)
            }
        }
        OpenAIError::JSONDeserialize(e) => ModelError::Malformed(e.to_string()),
        other => ModelError::Rejected(other.to_string()),
    }
}

/// Provider backed by an OpenAI-compatible HTTP API.
pub struct OpenAIProvider {
    provider: ProviderSettings,
    embedding: EmbeddingSettings,
    generation: GenerationSettings,
}

impl OpenAIProvider {
    pub fn new(settings: &Settings) -> Self {
        Self {
            provider: settings.provider.clone(),
            embedding: settings.embedding.clone(),
            generation: settings.generation.clone(),
        }
    }
}

impl Provider for OpenAIProvider {
    fn connect(&self, credentials: &Credentials) -> Result<Connection> {
        debug!("Connecting to {}", self.provider.api_base);
        let client = create_client(credentials, &self.provider)?;
        let retry = RetryPolicy::from(&self.provider);

        Ok(Connection {
            embedder: Arc::new(OpenAIEmbedder::new(client.clone(), &self.embedding, retry)),
            model: Arc::new(OpenAIChatModel::new(client, &self.generation)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_status_codes() {
        let auth = classify_error(OpenAIError::StreamError(
            "Invalid status code: 401 Unauthorized".to_string(),
        ));
        assert!(matches!(auth, ModelError::Auth(_)));

        let limited = classify_error(OpenAIError::StreamError(
            "Invalid status code: 429 Too Many Requests".to_string(),
        ));
        assert!(matches!(limited, ModelError::RateLimited(_)));

        let dropped = classify_error(OpenAIError::StreamError("connection closed".to_string()));
        assert!(matches!(dropped, ModelError::Transport(_)));
    }

    #[test]
    fn test_invalid_argument_is_rejected() {
        let error = classify_error(OpenAIError::InvalidArgument("bad".to_string()));
        assert!(matches!(error, ModelError::Rejected(_)));
    }

    #[test]
    fn test_provider_connects_without_network() {
        let provider = OpenAIProvider::new(&Settings::default());
        let credentials = Credentials::new("test-key").unwrap();
        let connection = provider.connect(&credentials).unwrap();
        assert_eq!(connection.embedder.model_id(), "text-embedding-004");
        assert_eq!(connection.model.model_id(), "gemini-1.5-flash");
    }
}
