//! # dbot-cli
//!
//! Wires config into a [`ToolOrchestrator`] and provides the terminal reply channel used by `ask`.

pub mod cli;
mod terminal;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dbot_core::{AppConfig, MemoryStoreType};
use llm_client::{LlmConfig, OpenAILlmClient, StreamAggregator};
use memory_core::{ConversationMemory, RecordStore};
use memory_inmemory::InMemoryRecordStore;
use memory_sqlite::SqliteRecordStore;
use plugin_orchestrator::{ActionExecutor, ToolOrchestrator};
use plugin_resolver::HttpPluginResolver;
use tracing::info;

pub use cli::{Cli, Commands};
pub use terminal::TerminalReplyChannel;

/// Opens the configured record store; the SQLite parent directory is created if missing.
pub async fn build_record_store(config: &AppConfig) -> Result<Arc<dyn RecordStore>> {
    match config.store_type()? {
        MemoryStoreType::Memory => {
            info!("Using in-memory conversation store");
            Ok(Arc::new(InMemoryRecordStore::new()))
        }
        MemoryStoreType::Sqlite => {
            let path = &config.memory_sqlite_path;
            if let Some(dir) = Path::new(path).parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("Create directory for {path}"))?;
                }
            }
            let store = SqliteRecordStore::new(path)
                .await
                .with_context(|| format!("Open SQLite memory at {path}"))?;
            Ok(Arc::new(store))
        }
    }
}

/// Builds the orchestrator; `use_plugin` routes queries through `PLUGIN_HOST` when it is set.
pub async fn build_orchestrator(config: &AppConfig, use_plugin: bool) -> Result<ToolOrchestrator> {
    let llm = OpenAILlmClient::with_base_url(
        config.llm.api_key().to_string(),
        config.llm.base_url().to_string(),
    )
    .with_model(config.llm.model());
    info!(model = %llm.model(), "LLM client ready");

    let store = build_record_store(config).await?;
    let memory = ConversationMemory::new(store, config.memory_max_content_length);
    let resolver = HttpPluginResolver::with_timeout(config.action_timeout())
        .context("Build plugin resolver HTTP client")?;
    let executor = ActionExecutor::with_timeout(config.action_timeout())
        .context("Build action executor HTTP client")?;
    let aggregator =
        StreamAggregator::new(config.llm.render_every_n(), config.llm.progress_marker());

    let orchestrator = ToolOrchestrator::new(
        Arc::new(llm),
        Arc::new(memory),
        Arc::new(resolver),
        executor,
    )
    .with_aggregator(aggregator);

    match config.plugin_host.as_deref() {
        Some(host) if use_plugin => {
            info!(plugin_host = %host, "Plugin mode");
            Ok(orchestrator.with_plugin(host))
        }
        _ => {
            info!("Plain chat mode");
            Ok(orchestrator)
        }
    }
}
