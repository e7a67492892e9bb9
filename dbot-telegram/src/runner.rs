//! REPL runner: each text message is handled in its own task so the REPL keeps polling.

use std::sync::Arc;

use anyhow::Result;
use plugin_orchestrator::{PipelineError, QueryRequest, ToolOrchestrator};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, instrument, warn};

use crate::commands::{Command, START_TEXT};
use crate::sink::{clip_for_telegram, TelegramReplyChannel};

/// Runs the bot until the process is stopped.
#[instrument(skip(bot, orchestrator))]
pub async fn run_bot(bot: Bot, orchestrator: Arc<ToolOrchestrator>) -> Result<()> {
    let username = match bot.get_me().await {
        Ok(me) => me.user.username.clone().unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "get_me failed; commands addressed with @username will not match");
            String::new()
        }
    };
    info!(username = %username, "Bot started");

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    let username = Arc::new(username);
    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let orchestrator = orchestrator.clone();
        let username = username.clone();

        async move {
            let Some(text) = msg.text().map(str::to_string) else {
                info!(chat_id = msg.chat.id.0, "Ignoring non-text message");
                return Ok(());
            };
            let request = query_request(&msg, text);
            info!(
                user_id = %request.user_id,
                chat_id = msg.chat.id.0,
                message_content = %request.text,
                "Received message"
            );

            let chat_id = msg.chat.id;
            tokio::spawn(async move {
                if let Err(e) = handle_text(bot, chat_id, &username, &orchestrator, request).await {
                    error!(error = %e, chat_id = chat_id.0, "Failed to handle message");
                }
            });
            Ok(())
        }
    })
    .await;

    Ok(())
}

async fn handle_text(
    bot: Bot,
    chat_id: ChatId,
    username: &str,
    orchestrator: &ToolOrchestrator,
    request: QueryRequest,
) -> Result<()> {
    let command = Command::parse(&request.text, username).ok();
    if let Some(command) = command {
        let reply = match command {
            Command::Start => START_TEXT.to_string(),
            Command::Help => Command::help_text(),
            Command::Newchat => match orchestrator.memory().clear(&request.user_id).await {
                Ok(()) => "Started a new conversation.".to_string(),
                Err(e) => {
                    error!(user_id = %request.user_id, error = %e, "Failed to clear memory");
                    "Sorry, I could not reset the conversation.".to_string()
                }
            },
        };
        bot.send_message(chat_id, reply).await?;
        return Ok(());
    }

    let channel = TelegramReplyChannel::new(bot.clone(), chat_id);
    match orchestrator.respond(&request, Some(&channel)).await {
        Ok(answer) => {
            info!(user_id = %request.user_id, answer_len = answer.len(), "Answered");
        }
        Err(e) => {
            warn!(user_id = %request.user_id, stage = %e.stage(), error = %e, "Pipeline failed");
            // The raw selection text is already the final render of the pending message.
            if !matches!(e, PipelineError::ActionParse { .. }) {
                bot.send_message(chat_id, clip_for_telegram(&e.user_message()))
                    .await?;
            }
        }
    }
    Ok(())
}

/// Memory is keyed by sender; channel posts without a sender fall back to the chat.
fn query_request(msg: &Message, text: String) -> QueryRequest {
    match msg.from.as_ref() {
        Some(user) => QueryRequest::new(user.id.0.to_string(), text)
            .with_display_name(user.first_name.clone()),
        None => QueryRequest::new(msg.chat.id.0.to_string(), text),
    }
}
