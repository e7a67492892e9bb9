//! # plugin-resolver
//!
//! Discovers what an external API ("plugin") can do.
//!
//! 1. `GET {manifest_url}/.well-known/ai-plugin.json` → [`PluginManifest`]
//! 2. `GET {manifest.api.url}` → OpenAPI document (YAML or JSON)
//! 3. Every `path × method` becomes one line of the capability summary.
//!
//! No caching and no retries; callers decide both.

mod error;
mod manifest;
mod openapi;

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, instrument};

pub use error::ResolutionError;
pub use manifest::{ManifestApi, PluginManifest, MANIFEST_PATH};
pub use openapi::{parse_api_spec, summarize_operations, ApiSpec, Operation, Parameter, Server};

/// What the orchestrator needs to know about a plugin, built fresh on every resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginCapability {
    pub display_name: String,
    pub description_for_model: String,
    pub api_host: String,
    pub capability_summary: String,
}

/// Resolution seam; the orchestrator depends on this rather than on HTTP.
#[async_trait]
pub trait CapabilityResolver: Send + Sync {
    async fn resolve(&self, manifest_url: &str) -> Result<PluginCapability, ResolutionError>;
}

/// [`CapabilityResolver`] over HTTP with reqwest.
#[derive(Clone)]
pub struct HttpPluginResolver {
    http: reqwest::Client,
}

impl HttpPluginResolver {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Client with a per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ResolutionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolutionError::Client(e.to_string()))?;
        Ok(Self::new(http))
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ResolutionError> {
        let fetch_error = |e: reqwest::Error| ResolutionError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        };
        self.http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fetch_error)?
            .text()
            .await
            .map_err(fetch_error)
    }
}

#[async_trait]
impl CapabilityResolver for HttpPluginResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, manifest_url: &str) -> Result<PluginCapability, ResolutionError> {
        let manifest_location = format!("{}{}", manifest_url.trim_end_matches('/'), MANIFEST_PATH);
        let manifest = PluginManifest::parse(&self.fetch_text(&manifest_location).await?)?;

        let spec_text = self.fetch_text(&manifest.api.url).await?;
        let spec = parse_api_spec(&spec_text)?;
        let api_host = spec.base_url()?.to_string();
        let capability_summary = summarize_operations(&spec);

        info!(
            name = %manifest.name_for_human,
            api_host = %api_host,
            operations = capability_summary.lines().count(),
            "Plugin resolved"
        );

        Ok(PluginCapability {
            display_name: manifest.name_for_human,
            description_for_model: manifest.description_for_model,
            api_host,
            capability_summary,
        })
    }
}
