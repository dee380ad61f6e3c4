//! Error types for Pagewise.

use thiserror::Error;

/// Library-level error type for Pagewise operations.
#[derive(Error, Debug)]
pub enum PagewiseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not read document: {0}")]
    Extraction(String),

    #[error("Could not extract text from '{0}'. The file might be empty, scanned or corrupted.")]
    EmptyDocument(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Failed to build index: {0}")]
    IndexBuild(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Prompt is too large for the model ({size} characters, limit is {limit})")]
    ContextTooLarge { size: usize, limit: usize },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("{0}")]
    Guard(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Pagewise operations.
pub type Result<T> = std::result::Result<T, PagewiseError>;
