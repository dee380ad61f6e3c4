//! Configuration module for Pagewise.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, FALLBACK_ANSWER};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, GenerationSettings, PromptSettings,
    ProviderSettings, RetrievalSettings, Settings, GEMINI_OPENAI_BASE,
};
