//! Edits one pending Telegram message in place.

use async_trait::async_trait;
use llm_client::RenderSink;
use plugin_orchestrator::ReplyChannel;
use teloxide::payloads::EditMessageTextSetters;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use teloxide::RequestError;
use tracing::{debug, warn};

/// Telegram rejects longer message texts.
pub const TELEGRAM_MAX_TEXT_CHARS: usize = 4096;
/// Shown instead of an empty completion; Telegram rejects empty texts.
pub const EMPTY_REPLY: &str = "(empty response)";

const MAX_RETRIES: usize = 3;

/// True when Telegram returns "message is not modified" (content unchanged); treat as success.
pub fn is_message_not_modified_error(error: &str) -> bool {
    error.contains("message is not modified") || error.contains("exactly the same")
}

/// Text as Telegram accepts it: non-empty and at most [`TELEGRAM_MAX_TEXT_CHARS`] characters.
pub fn clip_for_telegram(text: &str) -> String {
    if text.trim().is_empty() {
        return EMPTY_REPLY.to_string();
    }
    text.chars().take(TELEGRAM_MAX_TEXT_CHARS).collect()
}

pub struct TelegramRenderSink {
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
}

impl TelegramRenderSink {
    pub fn new(bot: Bot, chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            bot,
            chat_id,
            message_id,
        }
    }

    /// Edits the message, waiting out rate limits. "Not modified" counts as success.
    async fn edit(&self, text: &str, parse_mode: Option<ParseMode>) -> Result<(), RequestError> {
        let text = clip_for_telegram(text);
        let mut attempt = 0;
        loop {
            let mut request = self
                .bot
                .edit_message_text(self.chat_id, self.message_id, text.clone());
            if let Some(mode) = parse_mode {
                request = request.parse_mode(mode);
            }
            match request.await {
                Ok(_) => return Ok(()),
                Err(e) if is_message_not_modified_error(&e.to_string()) => {
                    debug!(message_id = self.message_id.0, "Message not modified");
                    return Ok(());
                }
                Err(RequestError::RetryAfter(wait)) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    warn!(
                        message_id = self.message_id.0,
                        retry_after_secs = wait.seconds(),
                        "Rate limited while editing message"
                    );
                    tokio::time::sleep(wait.duration()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl RenderSink for TelegramRenderSink {
    async fn render(&self, text: &str) -> anyhow::Result<()> {
        self.edit(text, None).await?;
        Ok(())
    }

    /// Markdown first; falls back to plain text when Telegram cannot parse the entities.
    #[allow(deprecated)]
    async fn render_final(&self, text: &str) -> anyhow::Result<()> {
        if let Err(e) = self.edit(text, Some(ParseMode::Markdown)).await {
            debug!(error = %e, "Markdown render rejected; sending plain text");
            self.edit(text, None).await?;
        }
        Ok(())
    }
}

/// One Telegram chat as a [`ReplyChannel`].
pub struct TelegramReplyChannel {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramReplyChannel {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl ReplyChannel for TelegramReplyChannel {
    async fn open(&self, placeholder: &str) -> anyhow::Result<Box<dyn RenderSink>> {
        let sent = self
            .bot
            .send_message(self.chat_id, clip_for_telegram(placeholder))
            .await?;
        Ok(Box::new(TelegramRenderSink::new(
            self.bot.clone(),
            self.chat_id,
            sent.id,
        )))
    }

    async fn post(&self, text: &str) -> anyhow::Result<()> {
        self.bot
            .send_message(self.chat_id, clip_for_telegram(text))
            .await?;
        Ok(())
    }
}
