//! # Prompt
//!
//! Conversation turns and the message lists sent to chat-completion models.
//!
//! ## Message lists
//!
//! - **Chat**: `System(MAIN_PROMPT)` → history → `User(query)`
//! - **Plugin selection**: `System(selection prompt + plugin description + capability summary)` → history → `User(query)`
//! - **Answer synthesis**: `System(PLUGIN_RESULT_PROMPT)` → history → `Assistant(api result excerpt)` → `User(query)`
//!
//! History is always passed oldest-first, exactly as the memory store returns it.
//!
//! ## External interactions
//!
//! - **AI models**: Output is sent to OpenAI-compatible chat completion APIs.

use serde::{Deserialize, Serialize};

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

/// A single conversation turn, one-to-one with one element of the OpenAI `messages` array.
///
/// Serialized as `{"role": "user", "content": "..."}` so persisted histories stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Content length in characters; the unit of every memory budget.
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// System prompt for plain chat mode.
pub const MAIN_PROMPT: &str = "You are AskUp, an AI chat bot in Telegram.
Please provide concise and wise answers to the questions asked by the users.
Try to be fun and engaging, but also polite and respectful.
";

/// Instructions for stage 1: pick one plugin path and a search query.
pub const PLUGIN_SELECT_PROMPT: &str = "You are an API caller plugin. Based on the user input, you will call a relevant API path with a relevant query.
Generate the query that gives the best results for the API path.
Note that the API is backed by a traditional search engine, so generate good search words rather than the entire sentence or the given question.
Please generate the query in the asked language.
For example, if asked in Korean, please generate the query in Korean.
Do not provide any explanation, just provide the API path with query parameters strictly in this format:
{'path': api_path, 'query': query}

If the question is not relevant to the plugin, please provide the best answer you can think of using previous context if any.
";

/// Instructions for stage 2: answer from the fetched API result.
pub const PLUGIN_RESULT_PROMPT: &str = "For the given user question, we have called the API and got search results in JSON format.
Please refer to these results and answer the user. If there are references, please provide them as well.
You can use Markdown to format the results.
";

/// Builds the stage-1 system prompt from a plugin's model-facing description and capability summary.
pub fn selection_system_prompt(description_for_model: &str, capability_summary: &str) -> String {
    format!("{PLUGIN_SELECT_PROMPT}\n{description_for_model}\n{capability_summary}")
}

/// Plain chat: `System(MAIN_PROMPT)`, history, then the user's query.
pub fn chat_messages(history: &[ChatMessage], query: &str) -> Vec<ChatMessage> {
    with_history(ChatMessage::system(MAIN_PROMPT), history, [ChatMessage::user(query)])
}

/// Stage 1: selection system prompt, history, then the user's query as the final turn.
pub fn selection_messages(
    system_prompt: &str,
    history: &[ChatMessage],
    query: &str,
) -> Vec<ChatMessage> {
    with_history(
        ChatMessage::system(system_prompt),
        history,
        [ChatMessage::user(query)],
    )
}

/// Stage 2: synthesis prompt, history, the API result as an assistant turn, then the user's query.
pub fn synthesis_messages(
    history: &[ChatMessage],
    api_result_excerpt: &str,
    query: &str,
) -> Vec<ChatMessage> {
    with_history(
        ChatMessage::system(PLUGIN_RESULT_PROMPT),
        history,
        [
            ChatMessage::assistant(api_result_excerpt),
            ChatMessage::user(query),
        ],
    )
}

fn with_history<T>(system: ChatMessage, history: &[ChatMessage], tail: T) -> Vec<ChatMessage>
where
    T: IntoIterator<Item = ChatMessage>,
{
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(system);
    messages.extend(history.iter().cloned());
    messages.extend(tail);
    messages
}
