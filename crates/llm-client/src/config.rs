//! LLM configuration: trait and env-based implementation.

use anyhow::{Context, Result};
use std::env;

use crate::aggregator::{DEFAULT_PROGRESS_MARKER, DEFAULT_RENDER_EVERY_N};
use crate::openai_llm::DEFAULT_MODEL;

/// LLM configuration interface for OpenAI-compatible APIs.
pub trait LlmConfig: Send + Sync {
    fn api_key(&self) -> &str;
    fn base_url(&self) -> &str;
    fn model(&self) -> &str;
    /// Marker glyph appended to partial renders.
    fn progress_marker(&self) -> &str;
    /// Render partial output after every n-th fragment.
    fn render_every_n(&self) -> usize;
}

/// LLM config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub llm_model: String,
    pub progress_marker: String,
    pub render_every_n: usize,
}

impl LlmConfig for EnvLlmConfig {
    fn api_key(&self) -> &str {
        &self.openai_api_key
    }
    fn base_url(&self) -> &str {
        &self.openai_base_url
    }
    fn model(&self) -> &str {
        &self.llm_model
    }
    fn progress_marker(&self) -> &str {
        &self.progress_marker
    }
    fn render_every_n(&self) -> usize {
        self.render_every_n
    }
}

impl EnvLlmConfig {
    /// Load from environment variables.
    ///
    /// `MODEL` falls back to `CHATGPT_ENGINE`, `RENDER_EVERY_N` to `UPDATE_CHAR_RATE`.
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let llm_model = env::var("MODEL")
            .or_else(|_| env::var("CHATGPT_ENGINE"))
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let progress_marker =
            env::var("BOT_PENCIL_ICON").unwrap_or_else(|_| DEFAULT_PROGRESS_MARKER.to_string());
        let render_every_n = match env::var("RENDER_EVERY_N").or_else(|_| env::var("UPDATE_CHAR_RATE")) {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("RENDER_EVERY_N must be a positive integer, got {raw:?}"))?,
            Err(_) => DEFAULT_RENDER_EVERY_N,
        };
        Ok(Self {
            openai_api_key,
            openai_base_url,
            llm_model,
            progress_marker,
            render_every_n,
        })
    }
}
