//! [`LlmClient`] backed by openai-client.

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use prompt::ChatMessage;
use tracing::instrument;

use super::{to_openai_messages, FragmentStream, LlmClient, StreamError};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Clone)]
pub struct OpenAILlmClient {
    client: openai_client::OpenAIClient,
    model: String,
}

impl OpenAILlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::new(api_key),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::with_base_url(api_key, base_url),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, messages), fields(model = %self.model))]
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let openai_messages = to_openai_messages(&messages)?;
        self.client.chat_completion(&self.model, openai_messages).await
    }

    fn stream(&self, messages: Vec<ChatMessage>) -> FragmentStream {
        match to_openai_messages(&messages) {
            Ok(openai_messages) => self
                .client
                .chat_completion_fragments(&self.model, openai_messages),
            Err(e) => {
                futures::stream::once(async move { Err(StreamError::Transport(e.to_string())) })
                    .boxed()
            }
        }
    }
}
