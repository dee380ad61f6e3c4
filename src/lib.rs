//! Pagewise - Chat with your documents
//!
//! Load a PDF or text document and ask questions that are answered only from
//! its content, with the passages each answer was grounded in.
//!
//! # Overview
//!
//! Pagewise allows you to:
//! - Extract text from PDF and plain text files, page by page
//! - Split it into overlapping chunks and index them in memory
//! - Retrieve the chunks most relevant to a question
//! - Stream an answer from a language model grounded in those chunks
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `document` - Document sources and text extraction
//! - `chunking` - Overlapping text chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory index bound to its embedder
//! - `llm` - Streaming language models
//! - `provider` - Credentials and model provider connections
//! - `rag` - Retrieval, prompt building and answer generation
//! - `session` - The chat session state machine
//!
//! # Example
//!
//! ```rust,no_run
//! use pagewise::config::Settings;
//! use pagewise::document::Upload;
//! use pagewise::session::Session;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut session = Session::from_settings(&settings)?;
//!     session.set_credentials(&std::env::var("PAGEWISE_API_KEY")?)?;
//!
//!     let upload = Upload::from_path(Path::new("report.pdf")).await?;
//!     let result = session.process_document(upload).await?;
//!     println!("Indexed {} chunks", result.chunks_indexed);
//!
//!     let answer = session.ask_question("What is the total?").await?.collect().await?;
//!     println!("{}", answer.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod provider;
pub mod rag;
pub mod retry;
pub mod session;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{PagewiseError, Result};
