//! Executes the chosen API call: `GET {api_host}{path}?query={query}`.

use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument};

use crate::ActionDescriptor;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Invalid API URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("API request failed: {0}")]
    Request(String),
    #[error("API response is not valid JSON: {0}")]
    Decode(String),
}

#[derive(Clone)]
pub struct ActionExecutor {
    http: reqwest::Client,
}

impl ActionExecutor {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ExecutionError> {
        reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map(Self::new)
            .map_err(|e| ExecutionError::Request(e.to_string()))
    }

    /// The query is percent-encoded as the single `query` parameter.
    ///
    /// `action.path` must be absolute and may only extend the host's path; a path that would
    /// change the scheme, host or port is rejected.
    pub fn action_url(api_host: &str, action: &ActionDescriptor) -> Result<Url, ExecutionError> {
        let invalid = |message: &str| ExecutionError::InvalidUrl {
            url: format!("{api_host}{}", action.path),
            message: message.to_string(),
        };

        let mut url = Url::parse(api_host).map_err(|e| invalid(&e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("API host cannot carry a path"));
        }
        let path = action.path.as_str();
        if !path.starts_with('/') || path.starts_with("//") || path.contains(['@', '\\']) {
            return Err(invalid("path must start with a single '/' and stay on the API host"));
        }

        let scheme = url.scheme().to_string();
        let host = url.host_str().map(str::to_string);
        let port = url.port_or_known_default();

        let full_path = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&full_path);
        url.set_query(None);
        url.set_fragment(None);

        if url.scheme() != scheme
            || url.host_str().map(str::to_string) != host
            || url.port_or_known_default() != port
        {
            return Err(invalid("path leaves the API host"));
        }

        url.query_pairs_mut().append_pair("query", &action.query);
        Ok(url)
    }

    #[instrument(skip(self), fields(path = %action.path))]
    pub async fn execute(
        &self,
        api_host: &str,
        action: &ActionDescriptor,
    ) -> Result<Value, ExecutionError> {
        let url = Self::action_url(api_host, action)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ExecutionError::Request(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ExecutionError::Decode(e.to_string()))?;
        info!(path = %action.path, "Plugin API call succeeded");
        Ok(body)
    }
}

/// Pretty-printed JSON cut to at most `max_chars` characters.
pub fn json_excerpt(value: &Value, max_chars: usize) -> String {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    text.chars().take(max_chars).collect()
}
