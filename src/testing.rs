//! Test doubles for the model provider.

use crate::embedding::{Embedder, HashEmbedder};
use crate::error::{PagewiseError, Result};
use crate::llm::{FragmentStream, LanguageModel};
use crate::provider::{Connection, Credentials, ModelError, Provider};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// What the scripted model does on one `complete` call.
pub enum Script {
    /// Stream these fragments, then finish.
    Answer(Vec<String>),
    /// Stream these fragments, then fail.
    Partial(Vec<String>, ModelError),
    /// Fail before streaming anything.
    Refuse(ModelError),
    /// Never produce a fragment.
    Stall,
}

impl Script {
    pub fn answer(fragments: &[&str]) -> Self {
        Script::Answer(fragments.iter().map(|f| f.to_string()).collect())
    }
}

/// Language model that plays back scripted responses and records prompts.
pub struct ScriptedModel {
    scripts: Mutex<VecDeque<Script>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModel {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prompts received so far, shared with the caller.
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        self.prompts.clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> std::result::Result<FragmentStream, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Refuse(ModelError::Rejected("no script left".into())));

        match script {
            Script::Answer(fragments) => Ok(stream::iter(fragments.into_iter().map(Ok)).boxed()),
            Script::Partial(fragments, error) => Ok(stream::iter(
                fragments
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(error))),
            )
            .boxed()),
            Script::Refuse(error) => Err(error),
            Script::Stall => Ok(stream::pending().boxed()),
        }
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Provider handing out a hash embedder and a scripted model.
pub struct FakeProvider {
    embedder: Arc<HashEmbedder>,
    model: Arc<ScriptedModel>,
}

impl FakeProvider {
    /// The key this provider rejects as invalid.
    pub const INVALID_KEY: &'static str = "invalid-key";

    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            embedder: Arc::new(HashEmbedder::default()),
            model: Arc::new(ScriptedModel::new(scripts)),
        }
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        self.model.prompts()
    }
}

impl Provider for FakeProvider {
    fn connect(&self, credentials: &Credentials) -> Result<Connection> {
        if credentials.api_key() == Self::INVALID_KEY {
            return Err(PagewiseError::Auth("API key not valid".to_string()));
        }
        Ok(Connection {
            embedder: self.embedder.clone() as Arc<dyn Embedder>,
            model: self.model.clone() as Arc<dyn LanguageModel>,
        })
    }
}
