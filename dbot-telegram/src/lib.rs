//! # dbot-telegram
//!
//! Telegram transport for the orchestrator: a [`TelegramReplyChannel`] that posts a placeholder and
//! edits it in place through [`TelegramRenderSink`], the `/start`, `/help`, `/newchat` commands, and
//! the REPL runner. No pipeline logic lives here.

mod commands;
mod runner;
mod sink;

pub use commands::{Command, HELP_TEXT, START_TEXT};
pub use runner::run_bot;
pub use sink::{
    clip_for_telegram, is_message_not_modified_error, TelegramRenderSink, TelegramReplyChannel,
    EMPTY_REPLY, TELEGRAM_MAX_TEXT_CHARS,
};
