//! CLI parser.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dbot")]
#[command(about = "Plugin-augmented chat bot: run on Telegram, ask from the terminal, reset memory", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the Telegram bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Answer one query in the terminal, using the same memory and plugin as the bot.
    Ask {
        /// Memory key for the conversation.
        #[arg(short, long, default_value = "cli")]
        user: String,
        /// Answer in plain chat mode even when PLUGIN_HOST is set.
        #[arg(long)]
        no_plugin: bool,
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Forget the conversation of one user.
    Reset {
        #[arg(short, long, default_value = "cli")]
        user: String,
    },
}

impl Commands {
    /// Token passed on the command line, if any.
    pub fn token_override(&self) -> Option<String> {
        match self {
            Commands::Run { token } => token.clone(),
            _ => None,
        }
    }
}
