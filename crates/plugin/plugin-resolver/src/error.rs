use thiserror::Error;

/// Plugin discovery failure. Always fatal for the query that needed the plugin.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("Invalid plugin manifest: {0}")]
    Manifest(String),
    #[error("Invalid OpenAPI document: {0}")]
    Spec(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("HTTP client error: {0}")]
    Client(String),
}
