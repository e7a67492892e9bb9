//! # OpenAI API client
//!
//! Thin wrapper around [async-openai] for chat completion, either as one final string or as a
//! lazy stream of text fragments. Stream failures are classified into [`StreamError::Protocol`]
//! (a chunk that does not have the expected shape) and [`StreamError::Transport`] (everything
//! else), so consumers can degrade differently.

use async_openai::error::OpenAIError;
use async_openai::types::{CreateChatCompletionRequestArgs, CreateChatCompletionStreamResponse};
use async_openai::Client;
use futures::stream::BoxStream;
use futures::{StreamExt, TryFutureExt};
use std::sync::Arc;
use thiserror::Error;

pub use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};

/// Failure while consuming a completion stream.
#[derive(Error, Debug)]
pub enum StreamError {
    /// A chunk was malformed or missing expected fields (no choices, undecodable JSON).
    #[error("{0}")]
    Protocol(String),
    /// Any other failure: connection, API error, request construction.
    #[error("{0}")]
    Transport(String),
}

impl From<OpenAIError> for StreamError {
    fn from(e: OpenAIError) -> Self {
        match e {
            OpenAIError::JSONDeserialize(e) => StreamError::Protocol(e.to_string()),
            other => StreamError::Transport(other.to_string()),
        }
    }
}

/// Lazy sequence of generated text fragments. A fragment may be empty (e.g. role-only deltas).
pub type FragmentStream = BoxStream<'static, Result<String, StreamError>>;

/// Masks an API key/token for safe logging: shows first 7 chars + "***" + last 4 chars.
/// If length <= 11, returns "***" to avoid leaking any part of the key.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_ascii() {
        return "***".to_string();
    }
    format!("{}***{}", &token[..7], &token[len - 4..])
}

/// Extracts the text fragment of one streamed chunk. A chunk without choices is a protocol error.
pub fn fragment_from_chunk(chunk: &CreateChatCompletionStreamResponse) -> Result<String, StreamError> {
    let choice = chunk
        .choices
        .first()
        .ok_or_else(|| StreamError::Protocol("stream chunk has no choices".to_string()))?;
    Ok(choice.delta.content.clone().unwrap_or_default())
}

/// OpenAI chat client. Wraps async-openai client; holds the API key only for masked logging.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Arc<Client<async_openai::config::OpenAIConfig>>,
    masked_key: String,
}

impl OpenAIClient {
    /// Builds a client using the given API key and default API base URL.
    pub fn new(api_key: String) -> Self {
        let masked_key = mask_token(&api_key);
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Arc::new(Client::with_config(config)),
            masked_key,
        }
    }

    /// Builds a client with a custom base URL (e.g. for proxies or compatible endpoints).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let masked_key = mask_token(&api_key);
        let config = async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            masked_key,
        }
    }

    /// Sends a chat completion request and returns the first choice's content.
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> anyhow::Result<String> {
        tracing::info!(
            model = %model,
            message_count = messages.len(),
            api_key = %self.masked_key,
            "OpenAI chat_completion request"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .build()?;

        let response = self.client.chat().create(request).await?;

        if let Some(ref u) = response.usage {
            tracing::info!(
                prompt_tokens = u.prompt_tokens,
                completion_tokens = u.completion_tokens,
                total_tokens = u.total_tokens,
                "OpenAI chat_completion usage"
            );
        }

        match response.choices.first() {
            Some(choice) => Ok(choice.message.content.clone().unwrap_or_default()),
            None => anyhow::bail!("No response from OpenAI"),
        }
    }

    /// Opens a streamed chat completion and yields one fragment per chunk.
    ///
    /// Nothing is sent until the stream is first polled; a failure to open the stream is
    /// delivered as the first item.
    pub fn chat_completion_fragments(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> FragmentStream {
        tracing::info!(
            model = %model,
            message_count = messages.len(),
            api_key = %self.masked_key,
            "OpenAI chat_completion_stream request"
        );

        let client = Arc::clone(&self.client);
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .stream(true)
            .build();

        async move {
            let request = request?;
            let stream = client.chat().create_stream(request).await?;
            Ok::<_, StreamError>(stream.map(|item| {
                item.map_err(StreamError::from)
                    .and_then(|chunk| fragment_from_chunk(&chunk))
            }))
        }
        .try_flatten_stream()
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(json: serde_json::Value) -> CreateChatCompletionStreamResponse {
        serde_json::from_value(json).expect("valid chunk json")
    }

    #[test]
    fn mask_token_hides_short_keys() {
        assert_eq!(mask_token(""), "***");
        assert_eq!(mask_token("sk-12345"), "***");
        assert_eq!(mask_token("sk-proj-123"), "***");
    }

    #[test]
    fn mask_token_keeps_head_and_tail_of_long_keys() {
        assert_eq!(mask_token("sk-proj-abcdefghijklmnop"), "sk-proj***mnop");
        assert_eq!(mask_token("sk-proj-1234567890").len(), 14);
    }

    #[test]
    fn json_errors_are_protocol_errors() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StreamError::from(OpenAIError::JSONDeserialize(json_err));
        assert!(matches!(err, StreamError::Protocol(_)));
    }

    #[test]
    fn other_openai_errors_are_transport_errors() {
        let err = StreamError::from(OpenAIError::StreamError("connection reset".to_string()));
        assert!(matches!(err, StreamError::Transport(ref m) if m.contains("connection reset")));
    }

    #[test]
    fn fragment_from_chunk_reads_delta_content() {
        let c = chunk(serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 1,
            "model": "gpt-3.5-turbo",
            "choices": [{"index": 0, "delta": {"content": "Hel"}, "finish_reason": null}]
        }));
        assert_eq!(fragment_from_chunk(&c).unwrap(), "Hel");
    }

    #[test]
    fn fragment_from_chunk_without_content_is_empty() {
        let c = chunk(serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 1,
            "model": "gpt-3.5-turbo",
            "choices": [{"index": 0, "delta": {"role": "assistant"}, "finish_reason": null}]
        }));
        assert_eq!(fragment_from_chunk(&c).unwrap(), "");
    }

    #[test]
    fn fragment_from_chunk_without_choices_is_protocol_error() {
        let c = chunk(serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 1,
            "model": "gpt-3.5-turbo",
            "choices": []
        }));
        assert!(matches!(
            fragment_from_chunk(&c),
            Err(StreamError::Protocol(_))
        ));
    }
}
