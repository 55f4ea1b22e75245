//! HTTP transport backed by a shared reqwest client

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{RunnerError, RunnerResult, TransportError};
use crate::traits::Transport;

/// Longest slice of an error body carried into a status error
const STATUS_BODY_LIMIT: usize = 200;

/// POSTs request bodies as JSON and decodes JSON responses.
///
/// One client serves the whole run; reqwest pools connections internally and
/// the client is safe to share between pipelines.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default client
    pub fn new() -> RunnerResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RunnerError::ConfigError {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self::with_client(client))
    }

    /// Create a transport around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| TransportError::Request {
            message: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: status_message(status, &text),
            });
        }

        serde_json::from_str(&text).map_err(|e| TransportError::Decode {
            message: e.to_string(),
        })
    }
}

fn status_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status.canonical_reason().unwrap_or("unexpected status").to_string();
    }

    match body.char_indices().nth(STATUS_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
