//! Mandrill `messages/send` over HTTPS.
//!
//! For reference: [Mandrill API docs](https://mailchimp.com/developer/transactional/api/messages/send-new-message/)
//!
//! # Example
//!
//! ```rust,ignore
//! use mandrill_relay::transport::HttpTransport;
//!
//! let transport = HttpTransport::new("md-xxxxxxxx");
//! ```
//!
//! The API key travels in the JSON body (`{"key": ..., "message": ...}`),
//! not in a header.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Transport;
use crate::config::{MandrillConfig, MANDRILL_BASE_URL};
use crate::error::MandrillError;

/// Mandrill API transport.
pub struct HttpTransport {
    api_key: String,
    base_url: String,
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: MANDRILL_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Create with a custom reqwest client.
    pub fn with_client(api_key: impl Into<String>, client: Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: MANDRILL_BASE_URL.to_string(),
            client,
        }
    }

    /// Create from an account configuration (key and base URL).
    pub fn from_config(config: &MandrillConfig) -> Self {
        Self::new(config.api_key.clone()).base_url(config.base_url.clone())
    }

    /// Set a custom base URL (for testing).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn send_url(&self) -> String {
        format!("{}/messages/send.json", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_message(&self, params: &Map<String, Value>) -> Result<Value, MandrillError> {
        let request = SendRequest {
            key: &self.api_key,
            message: params,
        };

        let response = self
            .client
            .post(self.send_url())
            .header("Accept", "application/json")
            .header("User-Agent", format!("mandrill-relay/{}", crate::VERSION))
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            Ok(serde_json::from_str(&body)?)
        } else {
            let error_body = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<MandrillApiError>(&error_body).unwrap_or(
                MandrillApiError {
                    status: "error".to_string(),
                    code: None,
                    name: "Unknown_Error".to_string(),
                    message: error_body,
                },
            );

            tracing::debug!(
                status = status.as_u16(),
                api_status = %error.status,
                code = ?error.code,
                name = %error.name,
                "Mandrill rejected request"
            );

            Err(MandrillError::provider_with_status(
                error.name,
                error.message,
                status.as_u16(),
            ))
        }
    }

    fn name(&self) -> &'static str {
        "mandrill"
    }
}

// ============================================================================
// Mandrill API Types
// ============================================================================

#[derive(Serialize)]
struct SendRequest<'a> {
    key: &'a str,
    message: &'a Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct MandrillApiError {
    #[serde(default)]
    status: String,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}
