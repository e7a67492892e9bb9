//! # LLM client abstraction
//!
//! Defines the [`LlmClient`] trait and an OpenAI implementation, plus the [`StreamAggregator`]
//! that turns a fragment stream into final text while rendering throttled partial output to a
//! [`RenderSink`]. Transport-agnostic; used by plugin-orchestrator, dbot-telegram and dbot-cli.

use anyhow::Result;
use async_trait::async_trait;
use openai_client::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use prompt::{ChatMessage, MessageRole};

mod aggregator;
mod config;
mod openai_llm;

pub use aggregator::{
    aggregate, RenderSink, StreamAggregator, DEFAULT_PROGRESS_MARKER, DEFAULT_RENDER_EVERY_N,
    PROTOCOL_ERROR_TAG, UNKNOWN_ERROR_TAG,
};
pub use config::{EnvLlmConfig, LlmConfig};
pub use openai_client::{FragmentStream, StreamError};
pub use openai_llm::OpenAILlmClient;

/// LLM client interface: completion or streamed completion from a list of messages.
///
/// Messages are sent as given; callers put their own system turn first.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the full reply text in one response.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Returns the reply as a lazy fragment stream. Opening failures surface as the first item.
    fn stream(&self, messages: Vec<ChatMessage>) -> FragmentStream;
}

/// Converts a single [`ChatMessage`] into OpenAI API message format.
fn chat_message_to_openai(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(openai_msg)
}

fn to_openai_messages(messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
    messages.iter().map(chat_message_to_openai).collect()
}
