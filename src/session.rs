//! Chat session over one document.
//!
//! A [`Session`] owns the credentials, the current [`Index`] and the chat
//! history. Every mutating operation takes `&mut self`, so a session runs at
//! most one operation at a time.

use crate::chunking::{Chunk, Chunker, ChunkingConfig, RecursiveChunker};
use crate::config::{Prompts, Settings};
use crate::document::{extract_pages, Upload};
use crate::error::{PagewiseError, Result};
use crate::openai::OpenAIProvider;
use crate::provider::{Connection, Credentials, Provider};
use crate::rag::{Answer, AnswerFragments, AnswerGenerator, PromptBuilder, Retriever};
use crate::retry::RetryPolicy;
use crate::vector_store::Index;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No credentials yet.
    Uninitialized,
    /// Credentials set, no document indexed.
    Configured,
    /// A document is indexed and questions can be asked.
    Indexed,
    /// An answer is being streamed.
    Querying,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Configured => "configured",
            SessionState::Indexed => "indexed",
            SessionState::Querying => "querying",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the chat history.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Chunks the answer was grounded in. Only set on assistant messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Chunk>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: None,
            created_at: Utc::now(),
        }
    }

    fn assistant(content: impl Into<String>, sources: Vec<Chunk>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources: Some(sources),
            created_at: Utc::now(),
        }
    }
}

/// Result of processing a document.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub document: String,
    pub pages: usize,
    pub chunks_indexed: usize,
    pub index_id: Uuid,
}

/// Tunables for the pipeline stages a session drives.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub chunking: ChunkingConfig,
    pub retriever: Retriever,
    pub prompt_builder: PromptBuilder,
    pub retry: RetryPolicy,
    pub embed_timeout: Duration,
    pub fragment_timeout: Duration,
}

impl SessionConfig {
    /// Build the session configuration from settings, loading prompt templates.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let embed_timeout = Duration::from_secs(settings.provider.embed_timeout_secs);

        Ok(Self {
            chunking: ChunkingConfig::try_from(&settings.chunking)?,
            retriever: Retriever::new(settings.retrieval.k).with_embed_timeout(embed_timeout),
            prompt_builder: PromptBuilder::new(prompts, settings.generation.max_prompt_chars),
            retry: RetryPolicy::from(&settings.provider),
            embed_timeout,
            fragment_timeout: Duration::from_secs(settings.provider.fragment_timeout_secs),
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            retriever: Retriever::default(),
            prompt_builder: PromptBuilder::default(),
            retry: RetryPolicy::default(),
            embed_timeout: Duration::from_secs(120),
            fragment_timeout: Duration::from_secs(60),
        }
    }
}

/// A chat session over a single indexed document.
pub struct Session {
    config: SessionConfig,
    provider: Arc<dyn Provider>,
    connection: Option<Connection>,
    index: Option<Index>,
    history: Vec<Message>,
    querying: bool,
}

impl Session {
    pub fn new(config: SessionConfig, provider: Arc<dyn Provider>) -> Self {
        Self {
            config,
            provider,
            connection: None,
            index: None,
            history: Vec::new(),
            querying: false,
        }
    }

    /// Create a session talking to the provider configured in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let config = SessionConfig::from_settings(settings)?;
        Ok(Self::new(config, Arc::new(OpenAIProvider::new(settings))))
    }

    pub fn state(&self) -> SessionState {
        if self.querying {
            SessionState::Querying
        } else if self.connection.is_none() {
            SessionState::Uninitialized
        } else if self.index.is_none() {
            SessionState::Configured
        } else {
            SessionState::Indexed
        }
    }

    pub fn credentials_configured(&self) -> bool {
        self.connection.is_some()
    }

    /// The current index, if a document has been processed.
    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Empty the chat history. The index is kept.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Set the API key and connect to the provider.
    ///
    /// The index and history are left alone. On failure the previous
    /// connection, if any, stays in place.
    pub fn set_credentials(&mut self, api_key: &str) -> Result<()> {
        let credentials = Credentials::new(api_key)?;
        let connection = self.provider.connect(&credentials)?;
        self.connection = Some(connection);
        info!("Credentials configured");
        Ok(())
    }

    /// Extract, chunk and index a document, replacing any previous one.
    ///
    /// History is cleared on success. On failure the session is unchanged.
    #[instrument(skip(self, upload), fields(document = %upload.name, kind = %upload.kind))]
    pub async fn process_document(&mut self, upload: Upload) -> Result<ProcessResult> {
        let connection = self.connection.clone().ok_or_else(|| {
            PagewiseError::Guard("Set an API key before processing a document.".to_string())
        })?;

        let pages = extract_pages(&upload).await?;
        let chunks = RecursiveChunker::new(self.config.chunking).chunk(&pages);
        if chunks.is_empty() {
            warn!("No text found in {}", upload.name);
            return Err(PagewiseError::EmptyDocument(upload.name));
        }

        let index = Index::build(
            &upload.name,
            chunks,
            connection.embedder.as_ref(),
            self.config.embed_timeout,
        )
        .await?;

        let result = ProcessResult {
            document: upload.name,
            pages: pages.len(),
            chunks_indexed: index.len(),
            index_id: index.id(),
        };

        if let Some(previous) = self.index.replace(index) {
            info!("Replaced index for {}", previous.document());
        }
        self.history.clear();

        info!(
            "Processed {} ({} pages, {} chunks)",
            result.document, result.pages, result.chunks_indexed
        );
        Ok(result)
    }

    /// Ask a question about the indexed document.
    ///
    /// The returned stream borrows the session until it is dropped. The
    /// question and answer are added to the history only once the answer
    /// has streamed to completion.
    #[instrument(skip(self))]
    pub async fn ask_question(&mut self, question: &str) -> Result<AnswerStream<'_>> {
        let connection = self.connection.clone().ok_or_else(|| {
            PagewiseError::Guard("Set an API key before asking questions.".to_string())
        })?;
        let index = self.index.as_ref().ok_or_else(|| {
            PagewiseError::Guard("Process a document before asking questions.".to_string())
        })?;

        let question = question.trim();
        if question.is_empty() {
            return Err(PagewiseError::InvalidInput(
                "Question must not be empty".to_string(),
            ));
        }

        let retrieved = self
            .config
            .retriever
            .retrieve(index, connection.embedder.as_ref(), question)
            .await?;
        let sources: Vec<Chunk> = retrieved.into_iter().map(|r| r.chunk).collect();

        let prompt = self.config.prompt_builder.build(question, &sources)?;

        let fragments = AnswerGenerator::new(connection.model.clone())
            .with_retry(self.config.retry)
            .with_fragment_timeout(self.config.fragment_timeout)
            .generate(&prompt)
            .await?;

        info!("Answering with {} source chunks", sources.len());
        self.querying = true;

        Ok(AnswerStream {
            session: self,
            fragments,
            question: question.to_string(),
            sources,
            text: String::new(),
            finished: false,
        })
    }
}

/// An answer being streamed from the model.
///
/// Dropping the stream before it finishes cancels the answer and leaves the
/// history untouched.
pub struct AnswerStream<'a> {
    session: &'a mut Session,
    fragments: AnswerFragments,
    question: String,
    sources: Vec<Chunk>,
    text: String,
    finished: bool,
}

impl AnswerStream<'_> {
    /// Wait for the next fragment of the answer.
    ///
    /// Returns `None` once the answer is complete or after an error.
    pub async fn next_fragment(&mut self) -> Option<Result<String>> {
        if self.finished {
            return None;
        }

        match self.fragments.next().await {
            Some(Ok(fragment)) => {
                self.text.push_str(&fragment);
                Some(Ok(fragment))
            }
            Some(Err(e)) => {
                self.finished = true;
                warn!("Answer failed after {} chars: {}", self.text.len(), e);
                Some(Err(e))
            }
            None => {
                self.finished = true;
                self.record();
                None
            }
        }
    }

    /// Text received so far.
    pub fn partial(&self) -> &str {
        &self.text
    }

    /// Chunks the answer is grounded in, in retrieval order.
    pub fn sources(&self) -> &[Chunk] {
        &self.sources
    }

    /// Drive the stream to completion.
    pub async fn collect(mut self) -> Result<Answer> {
        while let Some(fragment) = self.next_fragment().await {
            fragment?;
        }

        Ok(Answer {
            text: std::mem::take(&mut self.text),
            sources: std::mem::take(&mut self.sources),
        })
    }

    fn record(&mut self) {
        let history = &mut self.session.history;
        history.push(Message::user(self.question.as_str()));
        history.push(Message::assistant(
            self.text.as_str(),
            self.sources.clone(),
        ));
        debug!("History has {} messages", history.len());
    }
}

impl Drop for AnswerStream<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("Answer cancelled");
        }
        self.session.querying = false;
    }
}
