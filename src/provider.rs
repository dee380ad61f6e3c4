//! Model provider abstraction.
//!
//! A provider turns user credentials into a connected embedder and language model.

use crate::embedding::Embedder;
use crate::error::{PagewiseError, Result};
use crate::llm::LanguageModel;
use std::sync::Arc;
use thiserror::Error;

/// API credentials supplied by the user.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    /// Create credentials, rejecting empty keys.
    pub fn new(api_key: &str) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(PagewiseError::Auth("API key is empty".to_string()));
        }
        Ok(Self {
            api_key: api_key.to_string(),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Connected model capabilities.
#[derive(Clone)]
pub struct Connection {
    pub embedder: Arc<dyn Embedder>,
    pub model: Arc<dyn LanguageModel>,
}

/// Trait for model providers.
pub trait Provider: Send + Sync {
    /// Build clients for the given credentials.
    fn connect(&self, credentials: &Credentials) -> Result<Connection>;
}

/// Failure reported by a remote model API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid or missing credentials: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ModelError {
    /// Whether a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ModelError::RateLimited(_) | ModelError::Transport(_))
    }
}
