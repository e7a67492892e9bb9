//! dbot: run the Telegram bot, ask one query from the terminal, or reset a user's memory.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dbot_cli::{build_orchestrator, Cli, Commands, TerminalReplyChannel};
use dbot_core::{init_tracing, AppConfig};
use plugin_orchestrator::{PipelineError, QueryRequest};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.command.token_override()).context("Load config from env")?;
    config.validate()?;
    init_tracing(&config.log_file).context("Initialize logging")?;
    info!(config = ?config, "Config loaded");

    match cli.command {
        Commands::Run { .. } => {
            let token = config.require_bot_token()?.to_string();
            let orchestrator = build_orchestrator(&config, true).await?;
            dbot_telegram::run_bot(teloxide::Bot::new(token), Arc::new(orchestrator)).await
        }
        Commands::Ask {
            user,
            no_plugin,
            query,
        } => {
            let orchestrator = build_orchestrator(&config, !no_plugin).await?;
            let request = QueryRequest::new(user, query.join(" "));
            if let Err(e) = orchestrator
                .respond(&request, Some(&TerminalReplyChannel))
                .await
            {
                if !matches!(e, PipelineError::ActionParse { .. }) {
                    eprintln!("{}", e.user_message());
                }
                info!(stage = %e.stage(), error = %e, "Query failed");
            }
            Ok(())
        }
        Commands::Reset { user } => {
            let orchestrator = build_orchestrator(&config, false).await?;
            orchestrator.memory().clear(&user).await?;
            println!("Memory cleared for {user}.");
            Ok(())
        }
    }
}
