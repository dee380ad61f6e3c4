//! Language model abstraction for streamed completions.

mod openai;

pub use openai::OpenAIChatModel;

use crate::provider::ModelError;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Lazy sequence of text fragments from a language model.
pub type FragmentStream = BoxStream<'static, std::result::Result<String, ModelError>>;

/// Trait for streaming language models.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Start a completion for `prompt`. Failures may also arrive as stream items.
    async fn complete(&self, prompt: &str) -> std::result::Result<FragmentStream, ModelError>;

    /// Identifier of the model variant.
    fn model_id(&self) -> &str;
}
