use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use llm_client::{EnvLlmConfig, LlmConfig};
use memory_core::DEFAULT_MAX_CONTENT_LENGTH;
use openai_client::mask_token;

use crate::{DbotError, Result};

const DEFAULT_SQLITE_PATH: &str = "./data/memory.db";
const DEFAULT_LOG_FILE: &str = "logs/dbot.log";
const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;

/// Backend of the conversation memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStoreType {
    Memory,
    Sqlite,
}

impl FromStr for MemoryStoreType {
    type Err = DbotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(DbotError::Config(format!(
                "MEMORY_STORE_TYPE must be `memory` or `sqlite`, got {other:?}"
            ))),
        }
    }
}

/// Application config, loaded from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    /// Only the `run` command needs it.
    pub bot_token: Option<String>,
    pub llm: EnvLlmConfig,
    /// Plugin manifest base URL; unset means plain chat.
    pub plugin_host: Option<String>,
    pub memory_store_type: String,
    pub memory_sqlite_path: String,
    /// Per-user character budget.
    pub memory_max_content_length: usize,
    pub action_timeout_secs: u64,
    pub log_file: String,
}

impl AppConfig {
    /// Reads the environment; `token` overrides `BOT_TOKEN` when given.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = token
            .or_else(|| env::var("BOT_TOKEN").ok())
            .filter(|t| !t.trim().is_empty());
        let llm = EnvLlmConfig::from_env().map_err(|e| DbotError::Config(format!("{e:#}")))?;
        let plugin_host = env::var("PLUGIN_HOST")
            .ok()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        let memory_store_type =
            env::var("MEMORY_STORE_TYPE").unwrap_or_else(|_| "memory".to_string());
        let memory_sqlite_path =
            env::var("MEMORY_SQLITE_PATH").unwrap_or_else(|_| DEFAULT_SQLITE_PATH.to_string());
        let memory_max_content_length =
            parse_var("MEMORY_MAX_CONTENT_LENGTH", DEFAULT_MAX_CONTENT_LENGTH)?;
        let action_timeout_secs = parse_var("ACTION_TIMEOUT_SECS", DEFAULT_ACTION_TIMEOUT_SECS)?;
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());

        Ok(Self {
            bot_token,
            llm,
            plugin_host,
            memory_store_type,
            memory_sqlite_path,
            memory_max_content_length,
            action_timeout_secs,
            log_file,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.store_type()?;
        if self.llm.render_every_n() == 0 {
            return Err(DbotError::Config(
                "RENDER_EVERY_N must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn store_type(&self) -> Result<MemoryStoreType> {
        self.memory_store_type.parse()
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }

    pub fn require_bot_token(&self) -> Result<&str> {
        self.bot_token
            .as_deref()
            .ok_or_else(|| DbotError::Config("BOT_TOKEN not set (or pass --token)".to_string()))
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bot_token", &self.bot_token.as_deref().map(mask_token))
            .field("openai_api_key", &mask_token(self.llm.api_key()))
            .field("openai_base_url", &self.llm.base_url())
            .field("model", &self.llm.model())
            .field("render_every_n", &self.llm.render_every_n())
            .field("plugin_host", &self.plugin_host)
            .field("memory_store_type", &self.memory_store_type)
            .field("memory_sqlite_path", &self.memory_sqlite_path)
            .field("memory_max_content_length", &self.memory_max_content_length)
            .field("action_timeout_secs", &self.action_timeout_secs)
            .field("log_file", &self.log_file)
            .finish()
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| DbotError::Config(format!("{name} must be a number, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "BOT_TOKEN",
        "OPENAI_API_KEY",
        "OPENAI_BASE_URL",
        "MODEL",
        "CHATGPT_ENGINE",
        "BOT_PENCIL_ICON",
        "RENDER_EVERY_N",
        "UPDATE_CHAR_RATE",
        "PLUGIN_HOST",
        "MEMORY_STORE_TYPE",
        "MEMORY_SQLITE_PATH",
        "MEMORY_MAX_CONTENT_LENGTH",
        "ACTION_TIMEOUT_SECS",
        "LOG_FILE",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "test_key");

        let config = AppConfig::load(None).unwrap();

        assert!(config.bot_token.is_none());
        assert_eq!(config.llm.openai_api_key, "test_key");
        assert_eq!(config.llm.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.llm_model, "gpt-3.5-turbo");
        assert_eq!(config.llm.progress_marker, "*");
        assert_eq!(config.llm.render_every_n, 3);
        assert!(config.plugin_host.is_none());
        assert_eq!(config.store_type().unwrap(), MemoryStoreType::Memory);
        assert_eq!(config.memory_sqlite_path, "./data/memory.db");
        assert_eq!(config.memory_max_content_length, 1500);
        assert_eq!(config.action_timeout(), Duration::from_secs(30));
        assert_eq!(config.log_file, "logs/dbot.log");
        assert!(config.validate().is_ok());
        assert!(config.require_bot_token().is_err());
    }

    #[test]
    #[serial]
    fn test_load_config_with_custom_values() {
        clear_env();
        env::set_var("BOT_TOKEN", "env_token");
        env::set_var("OPENAI_API_KEY", "custom_key");
        env::set_var("OPENAI_BASE_URL", "https://custom.api.com");
        env::set_var("CHATGPT_ENGINE", "gpt-4");
        env::set_var("BOT_PENCIL_ICON", "✏️");
        env::set_var("UPDATE_CHAR_RATE", "5");
        env::set_var("PLUGIN_HOST", "https://weather.example ");
        env::set_var("MEMORY_STORE_TYPE", "sqlite");
        env::set_var("MEMORY_SQLITE_PATH", "/tmp/memory.db");
        env::set_var("MEMORY_MAX_CONTENT_LENGTH", "800");
        env::set_var("ACTION_TIMEOUT_SECS", "5");
        env::set_var("LOG_FILE", "/tmp/dbot.log");

        let config = AppConfig::load(Some("cli_token".to_string())).unwrap();

        assert_eq!(config.require_bot_token().unwrap(), "cli_token");
        assert_eq!(config.llm.openai_base_url, "https://custom.api.com");
        assert_eq!(config.llm.llm_model, "gpt-4");
        assert_eq!(config.llm.progress_marker, "✏️");
        assert_eq!(config.llm.render_every_n, 5);
        assert_eq!(config.plugin_host.as_deref(), Some("https://weather.example"));
        assert_eq!(config.store_type().unwrap(), MemoryStoreType::Sqlite);
        assert_eq!(config.memory_sqlite_path, "/tmp/memory.db");
        assert_eq!(config.memory_max_content_length, 800);
        assert_eq!(config.action_timeout_secs, 5);
        assert_eq!(config.log_file, "/tmp/dbot.log");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_model_prefers_model_over_alias() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "k");
        env::set_var("MODEL", "gpt-4o");
        env::set_var("CHATGPT_ENGINE", "gpt-4");

        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.llm.llm_model, "gpt-4o");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_api_key_is_config_error() {
        clear_env();
        let err = AppConfig::load(None).unwrap_err();
        assert!(matches!(err, DbotError::Config(msg) if msg.contains("OPENAI_API_KEY")));
    }

    #[test]
    #[serial]
    fn test_validate_rejects_unknown_store_and_zero_throttle() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "k");
        env::set_var("MEMORY_STORE_TYPE", "lance");
        let config = AppConfig::load(None).unwrap();
        assert!(config.validate().is_err());

        env::set_var("MEMORY_STORE_TYPE", "memory");
        env::set_var("RENDER_EVERY_N", "0");
        let config = AppConfig::load(None).unwrap();
        assert!(config.validate().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_non_numeric_budget_is_rejected() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "k");
        env::set_var("MEMORY_MAX_CONTENT_LENGTH", "lots");
        assert!(AppConfig::load(None).is_err());
        clear_env();
    }

    #[test]
    fn test_debug_masks_secrets() {
        let config = AppConfig {
            bot_token: Some("123456:ABCDEFGHIJKLMNOP".to_string()),
            llm: EnvLlmConfig {
                openai_api_key: "sk-abcdefghijklmnopqrstuvwxyz".to_string(),
                openai_base_url: "https://api.openai.com/v1".to_string(),
                llm_model: "gpt-3.5-turbo".to_string(),
                progress_marker: "*".to_string(),
                render_every_n: 3,
            },
            plugin_host: None,
            memory_store_type: "memory".to_string(),
            memory_sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            memory_max_content_length: 1500,
            action_timeout_secs: 30,
            log_file: DEFAULT_LOG_FILE.to_string(),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("ABCDEFGHIJKLMNOP"));
        assert!(!debug.contains("abcdefghijklmnopqrstuvwxyz"));
    }
}
