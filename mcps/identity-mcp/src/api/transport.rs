//! HTTP transport abstraction
//!
//! The executor talks to the upstream API through [`Transport`] so the
//! retry and auth logic can be exercised against a scripted transport.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{IdentityError, IdentityResult};

/// A single upstream request, relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// A raw upstream response; header names are lowercased
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Sends one request with the given extra headers and returns the response
/// regardless of status
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: &ApiRequest,
        headers: &[(&'static str, String)],
    ) -> IdentityResult<ApiResponse>;
}

/// reqwest-backed transport against a fixed base URL
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> IdentityResult<Self> {
        // Url::join drops the last path segment unless it ends with '/'
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| {
            IdentityError::Configuration(format!("invalid API URL '{}': {}", base_url, e))
        })?;

        let client = Client::builder()
            .user_agent(concat!("identity-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &str) -> IdentityResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| IdentityError::Configuration(format!("invalid API path '{}': {}", path, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        headers: &[(&'static str, String)],
    ) -> IdentityResult<ApiResponse> {
        let url = self.url_for(&request.path)?;
        debug!(method = %request.method, url = %url, "sending API request");

        let mut builder = self.client.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(ApiResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = ApiRequest::get("/check").query("address", "0xabc");
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query, vec![("address".to_string(), "0xabc".to_string())]);
        assert!(req.body.is_none());
    }

    #[test]
    fn test_url_join_keeps_base_path() {
        let transport =
            HttpTransport::new("https://api.example.com/v1", Duration::from_secs(5)).unwrap();
        let url = transport.url_for("/batch/check").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/batch/check");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTransport::new("not a url", Duration::from_secs(5)).err().unwrap();
        assert!(matches!(err, IdentityError::Configuration(_)));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = ApiResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: HashMap::from([("x-credits-remaining".to_string(), "12".to_string())]),
            body: String::new(),
        };
        assert_eq!(response.header("X-Credits-Remaining"), Some("12"));
        assert!(response.is_success());
    }
}
