//! Streamed answer generation.

use crate::error::{PagewiseError, Result};
use crate::llm::{FragmentStream, LanguageModel};
use crate::provider::ModelError;
use crate::retry::{with_retry, RetryPolicy};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Answer text fragments in arrival order. Ends after the first error.
pub type AnswerFragments = BoxStream<'static, Result<String>>;

/// Opens answer streams and guards them with timeouts and retries.
#[derive(Clone)]
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    retry: RetryPolicy,
    fragment_timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            retry: RetryPolicy::default(),
            fragment_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the longest wait for any single fragment.
    pub fn with_fragment_timeout(mut self, fragment_timeout: Duration) -> Self {
        self.fragment_timeout = fragment_timeout;
        self
    }

    /// Start generating an answer for `prompt`.
    ///
    /// The model is retried on transient failures until it produces its first
    /// fragment. After that, any failure ends the stream with a generation error.
    #[instrument(skip(self, prompt), fields(model = self.model.model_id()))]
    pub async fn generate(&self, prompt: &str) -> Result<AnswerFragments> {
        let fragment_timeout = self.fragment_timeout;

        let (first, rest) = with_retry(self.retry, "Language model", || {
            let model = self.model.clone();
            async move {
                let mut stream = model.complete(prompt).await?;
                let first = next_fragment(&mut stream, fragment_timeout).await?;
                Ok::<_, ModelError>((first, stream))
            }
        })
        .await
        .map_err(|e| match e {
            ModelError::Auth(message) => PagewiseError::Auth(message),
            other => PagewiseError::Generation(other.to_string()),
        })?;

        debug!("Answer stream started");

        let head = stream::iter(first.map(Ok));
        let tail = stream::unfold(Some(rest), move |state| async move {
            let Some(mut stream) = state else {
                return None;
            };
            match next_fragment(&mut stream, fragment_timeout).await {
                Ok(Some(text)) => Some((Ok(text), Some(stream))),
                Ok(None) => None,
                Err(e) => Some((Err(PagewiseError::Generation(e.to_string())), None)),
            }
        });

        Ok(head.chain(tail).boxed())
    }
}

/// Wait for the next non-empty fragment. `None` means the model finished.
async fn next_fragment(
    stream: &mut FragmentStream,
    fragment_timeout: Duration,
) -> std::result::Result<Option<String>, ModelError> {
    loop {
        let item = tokio::time::timeout(fragment_timeout, stream.next())
            .await
            .map_err(|_| {
                ModelError::Transport(format!(
                    "no response from the model for {:?}",
                    fragment_timeout
                ))
            })?;

        match item {
            Some(Ok(text)) if text.is_empty() => continue,
            Some(Ok(text)) => return Ok(Some(text)),
            Some(Err(e)) => return Err(e),
            None => return Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Script, ScriptedModel};
    use futures::TryStreamExt;

    fn generator(model: ScriptedModel) -> AnswerGenerator {
        AnswerGenerator::new(Arc::new(model)).with_retry(RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        })
    }

    #[tokio::test]
    async fn test_streams_fragments_in_order() {
        let model = ScriptedModel::new(vec![Script::answer(&["The sky ", "", "is blue."])]);
        let fragments: Vec<String> = generator(model)
            .generate("prompt")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(fragments, vec!["The sky ", "is blue."]);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_is_generation_error() {
        let model = ScriptedModel::new(vec![Script::Partial(
            vec!["The sky".to_string()],
            ModelError::Transport("connection reset".into()),
        )]);
        let mut stream = generator(model).generate("prompt").await.unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), "The sky");
        assert!(matches!(stream.next().await, Some(Err(PagewiseError::Generation(_)))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_retries_before_first_fragment() {
        let model = ScriptedModel::new(vec![
            Script::Refuse(ModelError::RateLimited("429".into())),
            Script::Partial(Vec::new(), ModelError::Transport("503".into())),
            Script::answer(&["ok"]),
        ]);
        let prompts = model.prompts();
        let fragments: Vec<String> = generator(model)
            .generate("prompt")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(fragments, vec!["ok"]);
        assert_eq!(prompts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_auth_failure_maps_to_auth_error() {
        let model = ScriptedModel::new(vec![Script::Refuse(ModelError::Auth("bad key".into()))]);
        let result = generator(model).generate("prompt").await;
        assert!(matches!(result, Err(PagewiseError::Auth(_))));
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out() {
        let model = ScriptedModel::new(vec![Script::Stall]);
        let result = AnswerGenerator::new(Arc::new(model))
            .with_retry(RetryPolicy::none())
            .with_fragment_timeout(Duration::from_millis(20))
            .generate("prompt")
            .await;

        match result {
            Err(PagewiseError::Generation(message)) => assert!(message.contains("20ms")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("stalled stream produced an answer"),
        }
    }
}
