//! Remote chat endpoint client
//!
//! POSTs `{"message": ...}` as JSON and expects `{"response": ...}` back.
//! One attempt per call; failures are returned to the caller untouched.

use crate::{ParleyError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Request body sent to the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub message: String,
}

/// Response body returned by the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
}

/// Something that answers a chat message
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn ask(&self, message: &str) -> Result<String>;
}

/// HTTP implementation of [`ChatBackend`]
pub struct HttpBackend {
    client: Client,
    endpoint: String,
}

impl HttpBackend {
    /// Create a backend for `endpoint` with an optional request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ParleyError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl ChatBackend for HttpBackend {
    async fn ask(&self, message: &str) -> Result<String> {
        let body = AskRequest {
            message: message.to_string(),
        };

        debug!(endpoint = %self.endpoint, chars = message.len(), "Sending chat request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ParleyError::NetworkError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ParleyError::NetworkError(format!("Failed to read response: {}", e)))?;

        // The server reports its own failures in the same shape as replies
        let parsed = serde_json::from_str::<AskResponse>(&text).ok();

        if !status.is_success() {
            let reason = parsed
                .map(|p| p.response)
                .unwrap_or_else(|| format!("Server returned {}", status));
            return Err(ParleyError::RemoteError(reason));
        }

        let parsed = parsed.ok_or_else(|| {
            ParleyError::SerializationError("Response is missing the \"response\" field".into())
        })?;

        debug!(status = %status, chars = parsed.response.len(), "Chat response received");
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_string(&AskRequest {
            message: "Hello".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"message":"Hello"}"#);
    }

    #[test]
    fn test_response_shape() {
        let parsed: AskResponse = serde_json::from_str(r#"{"response":"Hi"}"#).unwrap();
        assert_eq!(parsed.response, "Hi");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Port 9 (discard) on localhost is not expected to be listening
        let backend =
            HttpBackend::new("http://127.0.0.1:9/ask", Some(Duration::from_secs(2))).unwrap();
        let result = backend.ask("Hello").await;
        assert!(matches!(result, Err(ParleyError::NetworkError(_))));
    }
}
