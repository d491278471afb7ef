//! Chat completion client for OpenAI-compatible endpoints.

use anyhow::{anyhow, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;

use groundqa_core::config::ModelSettings;
use groundqa_core::traits::LanguageModel;

/// Client for an OpenAI-compatible endpoint with the built-in rate-limit
/// backoff disabled: a failed request surfaces on the first attempt.
pub fn openai_client(api_base: Option<&str>) -> Client<OpenAIConfig> {
    let mut cfg = OpenAIConfig::default();
    if let Some(url) = api_base { cfg = cfg.with_api_base(url); }
    let no_retry = ExponentialBackoffBuilder::new().with_max_elapsed_time(Some(Duration::ZERO)).build();
    Client::with_config(cfg).with_backoff(no_retry)
}

/// Sends each prompt as a single user message. One request per call, no retries.
#[derive(Clone)]
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiChatModel {
    pub fn new(settings: &ModelSettings) -> Self {
        Self { client: openai_client(settings.api_base.as_deref()), model: settings.chat_model.clone(), temperature: settings.temperature }
    }

    pub fn temperature(&self) -> f32 { self.temperature }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    fn model_id(&self) -> &str { &self.model }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default().content(prompt).build()?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .temperature(self.temperature)
            .messages(vec![message.into()])
            .build()?;
        let response = self.client.chat().create(request).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("model {} returned no content", self.model))?;
        tracing::debug!(model = %self.model, chars = text.len(), "completion received");
        Ok(text)
    }
}
