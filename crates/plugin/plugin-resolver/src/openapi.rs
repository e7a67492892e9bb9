//! The slice of an OpenAPI document the planner prompt needs: base URL and operations.

use serde::Deserialize;

use crate::ResolutionError;

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// Operations in document order.
#[derive(Debug, Clone, Default)]
pub struct ApiSpec {
    pub servers: Vec<Server>,
    pub operations: Vec<(String, String, Operation)>,
}

#[derive(Deserialize)]
struct RawSpec {
    #[serde(default)]
    servers: Vec<Server>,
    #[serde(default)]
    paths: serde_yaml::Mapping,
}

impl ApiSpec {
    /// `servers[0].url`.
    pub fn base_url(&self) -> Result<&str, ResolutionError> {
        self.servers
            .first()
            .map(|s| s.url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or(ResolutionError::MissingField("servers[0].url"))
    }
}

/// Parses a YAML or JSON OpenAPI document. Non-method keys of a path item are skipped.
pub fn parse_api_spec(text: &str) -> Result<ApiSpec, ResolutionError> {
    let spec_error = |e: serde_yaml::Error| ResolutionError::Spec(e.to_string());
    let raw: RawSpec = serde_yaml::from_str(text).map_err(spec_error)?;

    let mut operations = Vec::new();
    for (path, item) in raw.paths {
        let path = path
            .as_str()
            .ok_or_else(|| ResolutionError::Spec("path keys must be strings".to_string()))?
            .to_string();
        let serde_yaml::Value::Mapping(methods) = item else {
            continue;
        };
        for (method, op) in methods {
            let Some(method) = method.as_str().map(str::to_ascii_lowercase) else {
                continue;
            };
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            let op: Operation = serde_yaml::from_value(op).map_err(spec_error)?;
            operations.push((path.clone(), method, op));
        }
    }

    Ok(ApiSpec {
        servers: raw.servers,
        operations,
    })
}

/// One line per operation: ``For {summary}, call path `{path}` with parameters `{names}` ``.
pub fn summarize_operations(spec: &ApiSpec) -> String {
    let mut summary = String::new();
    for (path, method, op) in &spec.operations {
        let names: Vec<&str> = op
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        let what = if op.summary.trim().is_empty() {
            format!("{} {}", method.to_ascii_uppercase(), path)
        } else {
            op.summary.trim().to_string()
        };
        summary.push_str(&format!(
            "For {what}, call path `{path}` with parameters `{}`\n",
            names.join(" ")
        ));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r#"
openapi: 3.0.1
info:
  title: Search
  version: "1.0"
servers:
  - url: https://search.example/
paths:
  /search:
    parameters:
      - name: shared
    get:
      summary: searching the web
      parameters:
        - name: query
          in: query
        - name: limit
          in: query
  /news:
    get:
      summary: latest news
      parameters:
        - name: query
    post:
      parameters: []
"#;

    #[test]
    fn summarizes_every_method_in_document_order() {
        let spec = parse_api_spec(SPEC).unwrap();
        let summary = summarize_operations(&spec);
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(
            lines,
            vec![
                "For searching the web, call path `/search` with parameters `query limit`",
                "For latest news, call path `/news` with parameters `query`",
                "For POST /news, call path `/news` with parameters ``",
            ]
        );
    }

    #[test]
    fn base_url_is_first_server_without_trailing_slash() {
        let spec = parse_api_spec(SPEC).unwrap();
        assert_eq!(spec.base_url().unwrap(), "https://search.example");
    }

    #[test]
    fn json_documents_are_accepted() {
        let spec = parse_api_spec(
            r#"{"servers": [{"url": "http://h"}],
                "paths": {"/weather": {"get": {"summary": "weather", "parameters": [{"name": "query"}]}}}}"#,
        )
        .unwrap();
        assert_eq!(
            summarize_operations(&spec),
            "For weather, call path `/weather` with parameters `query`\n"
        );
    }

    #[test]
    fn missing_servers_is_missing_field() {
        let spec = parse_api_spec("paths: {}").unwrap();
        assert!(matches!(
            spec.base_url(),
            Err(ResolutionError::MissingField("servers[0].url"))
        ));
    }

    #[test]
    fn malformed_document_is_spec_error() {
        assert!(matches!(
            parse_api_spec("paths: [unclosed"),
            Err(ResolutionError::Spec(_))
        ));
    }
}
