//! Integration tests for [`plugin_resolver::HttpPluginResolver`] against a mockito server.

use plugin_resolver::{CapabilityResolver, HttpPluginResolver, ResolutionError};

fn manifest_json(spec_url: &str) -> String {
    serde_json::json!({
        "schema_version": "v1",
        "name_for_human": "Weather Helper",
        "description_for_model": "Look up the current weather of a city.",
        "api": {"type": "openapi", "url": spec_url}
    })
    .to_string()
}

fn spec_yaml(host: &str) -> String {
    format!(
        "openapi: 3.0.1\nservers:\n  - url: {host}\npaths:\n  /weather:\n    get:\n      summary: current weather\n      parameters:\n        - name: query\n          in: query\n"
    )
}

/// **Test: Manifest and spec are fetched and digested into a capability.**
///
/// **Setup:** mockito serves the manifest at the well-known path and the YAML spec.
/// **Expected:** name, description, host and a `/weather` summary line.
#[tokio::test]
async fn resolve_builds_capability_from_manifest_and_spec() {
    let mut server = mockito::Server::new_async().await;
    let spec_url = format!("{}/openapi.yaml", server.url());
    let manifest = server
        .mock("GET", "/.well-known/ai-plugin.json")
        .with_header("content-type", "application/json")
        .with_body(manifest_json(&spec_url))
        .create_async()
        .await;
    let spec = server
        .mock("GET", "/openapi.yaml")
        .with_body(spec_yaml("https://api.weather.example"))
        .create_async()
        .await;

    let resolver = HttpPluginResolver::new(reqwest::Client::new());
    let capability = resolver
        .resolve(&format!("{}/", server.url()))
        .await
        .unwrap();

    manifest.assert_async().await;
    spec.assert_async().await;
    assert_eq!(capability.display_name, "Weather Helper");
    assert_eq!(
        capability.description_for_model,
        "Look up the current weather of a city."
    );
    assert_eq!(capability.api_host, "https://api.weather.example");
    assert_eq!(
        capability.capability_summary,
        "For current weather, call path `/weather` with parameters `query`\n"
    );
}

/// **Test: Missing manifest is a fetch error.**
#[tokio::test]
async fn missing_manifest_is_fetch_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/.well-known/ai-plugin.json")
        .with_status(404)
        .create_async()
        .await;

    let resolver = HttpPluginResolver::new(reqwest::Client::new());
    let err = resolver.resolve(&server.url()).await.unwrap_err();

    assert!(matches!(err, ResolutionError::Fetch { ref url, .. } if url.ends_with("/.well-known/ai-plugin.json")));
}

/// **Test: Spec without servers fails with a missing-field error.**
#[tokio::test]
async fn spec_without_servers_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let spec_url = format!("{}/openapi.yaml", server.url());
    server
        .mock("GET", "/.well-known/ai-plugin.json")
        .with_body(manifest_json(&spec_url))
        .create_async()
        .await;
    server
        .mock("GET", "/openapi.yaml")
        .with_body("openapi: 3.0.1\npaths: {}\n")
        .create_async()
        .await;

    let resolver = HttpPluginResolver::new(reqwest::Client::new());
    let err = resolver.resolve(&server.url()).await.unwrap_err();

    assert!(matches!(err, ResolutionError::MissingField("servers[0].url")));
}

/// **Test: Manifest without required fields is a manifest error.**
#[tokio::test]
async fn manifest_missing_fields_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/.well-known/ai-plugin.json")
        .with_body(r#"{"name_for_human": "Broken"}"#)
        .create_async()
        .await;

    let resolver = HttpPluginResolver::new(reqwest::Client::new());
    let err = resolver.resolve(&server.url()).await.unwrap_err();

    assert!(matches!(err, ResolutionError::Manifest(_)));
}
