//! Grounded prompt assembly.

use crate::chunking::Chunk;
use crate::config::{Prompts, FALLBACK_ANSWER};
use crate::error::{PagewiseError, Result};
use std::collections::HashMap;

/// Join chunk texts in retrieval order, one per line.
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the prompt that restricts the model to the retrieved context.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    prompts: Prompts,
    max_prompt_chars: usize,
}

impl PromptBuilder {
    pub fn new(prompts: Prompts, max_prompt_chars: usize) -> Self {
        Self {
            prompts,
            max_prompt_chars,
        }
    }

    /// Render the prompt for `question` over `chunks`.
    ///
    /// Fails with [`PagewiseError::ContextTooLarge`] instead of truncating.
    pub fn build(&self, question: &str, chunks: &[Chunk]) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context(chunks));
        vars.insert("fallback".to_string(), FALLBACK_ANSWER.to_string());

        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.rag.template, &vars);

        let size = prompt.chars().count();
        if size > self.max_prompt_chars {
            return Err(PagewiseError::ContextTooLarge {
                size,
                limit: self.max_prompt_chars,
            });
        }

        Ok(prompt)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(Prompts::default(), 400_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk::new("Water is wet.", 1, 4),
            Chunk::new("The sky is blue.", 1, 0),
        ]
    }

    #[test]
    fn test_prompt_contains_context_in_order() {
        let prompt = PromptBuilder::default()
            .build("What colour is the sky?", &chunks())
            .unwrap();

        assert!(prompt.contains("Water is wet.\nThe sky is blue."));
        assert!(prompt.contains("Question:\nWhat colour is the sky?"));
        assert!(prompt.contains("based only on the provided context"));
    }

    #[test]
    fn test_prompt_mandates_exact_fallback() {
        let prompt = PromptBuilder::default().build("Anything?", &chunks()).unwrap();
        assert!(prompt.contains(&format!("say \"{}\"", FALLBACK_ANSWER)));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_chunk_text_is_kept_verbatim() {
        let chunks = vec![
            Chunk::new("Templates use {{question}} markers.", 1, 0),
            Chunk::new("Braces like {{fallback}} stay too.", 1, 1),
        ];
        let question = "What does {{context}} mean?";

        for _ in 0..50 {
            let prompt = PromptBuilder::default().build(question, &chunks).unwrap();
            assert!(prompt.contains(
                "Templates use {{question}} markers.\nBraces like {{fallback}} stay too."
            ));
            assert!(prompt.contains("Question:\nWhat does {{context}} mean?"));
            assert_eq!(prompt.matches("Templates use").count(), 1);
        }
    }

    #[test]
    fn test_context_too_large() {
        let builder = PromptBuilder::new(Prompts::default(), 50);
        match builder.build("What colour is the sky?", &chunks()) {
            Err(PagewiseError::ContextTooLarge { size, limit }) => {
                assert_eq!(limit, 50);
                assert!(size > 50);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
