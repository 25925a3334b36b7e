//! Scripted transport for testing.
//!
//! Responses are served in the order they were queued and every request is
//! recorded, so tests can assert exact call counts and payloads without any
//! network access.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::{IdentityError, IdentityResult};

/// A request as the transport saw it, including injected headers
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request: ApiRequest,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory [`Transport`] replaying queued responses
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn push(&self, response: ApiResponse) -> &Self {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
        self
    }

    /// Queue a JSON response with the given status
    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push(json_response(status, body))
    }

    /// Number of requests sent so far
    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Every request sent so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

/// Build a JSON response with a canonical status text
pub fn json_response(status: u16, body: Value) -> ApiResponse {
    let status_text = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
        .to_string();

    ApiResponse {
        status,
        status_text,
        headers: HashMap::from([("content-type".to_string(), "application/json".to_string())]),
        body: body.to_string(),
    }
}

/// Add a header to a response
pub fn with_header(mut response: ApiResponse, name: &str, value: &str) -> ApiResponse {
    response
        .headers
        .insert(name.to_ascii_lowercase(), value.to_string());
    response
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        headers: &[(&'static str, String)],
    ) -> IdentityResult<ApiResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                request: request.clone(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            });
        }

        self.responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .ok_or_else(|| {
                IdentityError::Transport(format!(
                    "no scripted response for {} {}",
                    request.method, request.path
                ))
            })
    }
}
