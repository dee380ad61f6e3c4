//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Retrieval picks the passages, the prompt builder grounds the question in them,
//! and the generator streams the model's answer.

pub mod generator;
pub mod prompt;
pub mod retriever;

pub use generator::{AnswerFragments, AnswerGenerator};
pub use prompt::PromptBuilder;
pub use retriever::Retriever;

use crate::chunking::Chunk;
use serde::Serialize;

/// A completed answer with the chunks it was grounded in.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The generated answer.
    pub text: String,
    /// Source chunks used for the answer, in retrieval order.
    pub sources: Vec<Chunk>,
}

impl Answer {
    /// Format the answer with a sources section for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.text.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\n[page {}] {}",
                    source.source_page,
                    preview(&source.text, 120)
                ));
            }
        }

        output
    }
}

/// Single-line preview of a passage, cut at `max_chars` characters.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
