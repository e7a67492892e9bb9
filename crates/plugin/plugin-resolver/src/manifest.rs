//! `ai-plugin.json` manifest.

use serde::Deserialize;

use crate::ResolutionError;

/// Well-known location of the manifest, relative to the plugin host.
pub const MANIFEST_PATH: &str = "/.well-known/ai-plugin.json";

#[derive(Debug, Clone, Deserialize)]
pub struct PluginManifest {
    pub name_for_human: String,
    pub description_for_model: String,
    pub api: ManifestApi,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestApi {
    /// URL of the OpenAPI document.
    pub url: String,
}

impl PluginManifest {
    pub fn parse(json: &str) -> Result<Self, ResolutionError> {
        serde_json::from_str(json).map_err(|e| ResolutionError::Manifest(e.to_string()))
    }
}
