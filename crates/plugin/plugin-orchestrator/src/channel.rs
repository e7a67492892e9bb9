//! Where the pipeline shows progress: one placeholder message per completion pass.

use async_trait::async_trait;
use llm_client::RenderSink;

/// Reply surface of one conversation (a Telegram chat, a terminal).
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    /// Posts `placeholder` and returns a sink that edits that message in place.
    async fn open(&self, placeholder: &str) -> anyhow::Result<Box<dyn RenderSink>>;

    /// Posts a standalone message.
    async fn post(&self, text: &str) -> anyhow::Result<()>;
}
