//! Chat-completions summarizer.
//!
//! Talks to any OpenAI-compatible endpoint through `async-openai`. Only
//! available when the `openai` feature is enabled.

use crate::error::{ModelError, Result};
use crate::model::{InferenceBackend, SummaryLength};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};

/// Model used when `OPENAI_MODEL` is not set.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You summarize video transcripts. Reply with the summary only, \
written as plain prose in the transcript's language. Do not add facts that are not in the text.";

/// Summarizer backed by a chat-completions API.
///
/// `load` builds the client and checks that the configured model exists,
/// so a bad key or model name surfaces as a load failure rather than as a
/// failure of every chunk.
pub struct OpenAiBackend {
    model: String,
    api_key: Option<String>,
    api_base: Option<String>,
    client: RwLock<Option<Client<OpenAIConfig>>>,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl OpenAiBackend {
    /// Creates a backend for `model` using the client's default credentials.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: None,
            client: RwLock::new(None),
        }
    }

    /// Creates a backend from `OPENAI_API_KEY`, `OPENAI_MODEL` and
    /// `OPENAI_BASE_URL`.
    #[must_use]
    pub fn from_env() -> Self {
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string());
        let mut backend = Self::new(model);
        backend.api_key = std::env::var("OPENAI_API_KEY").ok();
        backend.api_base = std::env::var("OPENAI_BASE_URL").ok();
        backend
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> Result<Client<OpenAIConfig>> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ModelError::NotLoaded.into())
    }

    fn set_client(&self, client: Option<Client<OpenAIConfig>>) {
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = client;
    }

    fn load_failed(&self, reason: impl ToString) -> ModelError {
        ModelError::LoadFailed {
            backend: self.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

fn inference_failed(reason: impl ToString) -> ModelError {
    ModelError::Inference {
        reason: reason.to_string(),
    }
}

#[async_trait]
impl InferenceBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn supports_concurrent_inference(&self) -> bool {
        true
    }

    async fn load(&self) -> Result<()> {
        let mut config = OpenAIConfig::new();
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        if let Some(base) = &self.api_base {
            config = config.with_api_base(base);
        }
        let client = Client::with_config(config);

        client
            .models()
            .retrieve(&self.model)
            .await
            .map_err(|e| self.load_failed(e))?;

        tracing::debug!(model = %self.model, "Verified chat model");
        self.set_client(Some(client));
        Ok(())
    }

    async fn unload(&self) {
        self.set_client(None);
    }

    async fn infer(&self, text: &str, length: SummaryLength) -> Result<String> {
        let client = self.client()?;
        let prompt = format!(
            "Summarize the following transcript excerpt in {min} to {max} words.\n\n{text}",
            min = length.min_length,
            max = length.max_length,
        );

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(inference_failed)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(inference_failed)?
                .into(),
        ];

        // Words run a little over one token each
        let max_tokens = u32::try_from(length.max_length.saturating_mul(2)).unwrap_or(u32::MAX);

        #[allow(deprecated)]
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_tokens(max_tokens)
            .temperature(0.0)
            .messages(messages)
            .build()
            .map_err(inference_failed)?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(inference_failed)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| inference_failed("empty completion").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let backend = OpenAiBackend::new("gpt-4o-mini")
            .with_api_key("sk-test")
            .with_api_base("http://localhost:1");
        assert_eq!(backend.model(), "gpt-4o-mini");
        assert_eq!(backend.name(), "openai");
        assert!(backend.supports_concurrent_inference());
        assert!(!format!("{backend:?}").contains("sk-test"));
    }

    #[tokio::test]
    async fn test_infer_before_load_fails() {
        let backend = OpenAiBackend::new("gpt-4o-mini");
        let err = backend
            .infer("text", SummaryLength::new(150, 40))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Model(ModelError::NotLoaded)));
    }
}
