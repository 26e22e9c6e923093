//! Transport that only logs.
//!
//! Useful for staging environments or when you want to see what would be
//! sent without calling Mandrill.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::Transport;
use crate::error::MandrillError;

/// Logger transport that emits tracing events for messages.
pub struct LoggerTransport {
    /// If true, log bodies and every parameter. If false, just a summary.
    log_full: bool,
}

impl LoggerTransport {
    /// Create a logger transport with brief output.
    pub fn new() -> Self {
        Self { log_full: false }
    }

    /// Create a logger transport that also logs bodies.
    pub fn full() -> Self {
        Self { log_full: true }
    }
}

impl Default for LoggerTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LoggerTransport {
    async fn send_message(&self, params: &Map<String, Value>) -> Result<Value, MandrillError> {
        let recipients: Vec<&str> = params
            .get("to")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|r| r.get("email").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();

        // Field expressions inside tracing macros see `tracing::field::Value`,
        // so the serde_json lookups happen out here.
        let from = params.get("from_email").and_then(Value::as_str);
        let subject = params.get("subject").and_then(Value::as_str);
        let attachments = params
            .get("attachments")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        tracing::info!(
            to = ?recipients,
            from = ?from,
            subject = ?subject,
            attachments = attachments,
            "Message logged"
        );

        if self.log_full {
            if let Some(text) = params.get("text").and_then(Value::as_str) {
                tracing::debug!(body = %text, "Text body");
            }
            if let Some(html) = params.get("html").and_then(Value::as_str) {
                tracing::debug!(body = %html, "HTML body");
            }
            let keys: Vec<&String> = params.keys().collect();
            tracing::debug!(keys = ?keys, "Message parameters");
        }

        let statuses: Vec<Value> = recipients
            .iter()
            .map(|email| {
                json!({
                    "email": email,
                    "status": "queued",
                    "reject_reason": null,
                    "_id": uuid::Uuid::new_v4().simple().to_string(),
                })
            })
            .collect();

        Ok(Value::Array(statuses))
    }

    fn name(&self) -> &'static str {
        "logger"
    }
}
