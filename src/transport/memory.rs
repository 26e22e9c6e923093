//! In-memory transport for development and tests.
//!
//! Records every payload it is handed and answers the way Mandrill would
//! for a fully accepted message, unless told otherwise.
//!
//! ```rust,ignore
//! use mandrill_relay::transport::MemoryTransport;
//! use mandrill_relay::testing::*;
//!
//! #[tokio::test]
//! async fn test_sends_welcome_email() {
//!     let transport = Arc::new(MemoryTransport::new());
//!     let mailer = MandrillMailer::with_transport(config, transport.clone());
//!
//!     send_welcome_email(&mailer, "user@example.com").await;
//!
//!     assert_sent_to(&transport, "user@example.com");
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{json, Map, Value};

use super::Transport;
use crate::error::MandrillError;

/// A payload captured by [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Unique identifier for this capture.
    pub id: String,
    /// The `message` parameters exactly as submitted.
    pub params: Map<String, Value>,
    pub sent_at: DateTime<Utc>,
}

impl SentMessage {
    /// Recipient emails from the `to` parameter.
    pub fn recipients(&self) -> Vec<String> {
        self.params
            .get("to")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|r| r.get("email").and_then(Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A string parameter, if present.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}

/// Transport that stores payloads instead of sending them.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: RwLock<Vec<SentMessage>>,
    /// Canned response body; `None` means "accept every recipient".
    response: RwLock<Option<Value>>,
    /// If set, send_message() returns this error.
    fail_with: RwLock<Option<MandrillError>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Response Scripting
    // =========================================================================

    /// Answer every send with this body.
    pub fn respond_with(&self, body: Value) {
        *self.response.write() = Some(body);
    }

    /// Fail every send with this error.
    ///
    /// The payload is still recorded; the call did happen.
    pub fn set_failure(&self, error: MandrillError) {
        *self.fail_with.write() = Some(error);
    }

    /// Go back to accepting every recipient.
    pub fn reset_response(&self) {
        *self.response.write() = None;
        *self.fail_with.write() = None;
    }

    // =========================================================================
    // Captured Payloads
    // =========================================================================

    /// All captured payloads, oldest first.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().clone()
    }

    /// The most recent payload.
    pub fn last_sent(&self) -> Option<SentMessage> {
        self.sent.read().last().cloned()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.read().len()
    }

    /// Remove and return all captured payloads.
    pub fn flush(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.sent.write())
    }

    pub fn clear(&self) {
        self.sent.write().clear();
    }

    fn accepted_response(params: &Map<String, Value>) -> Value {
        let statuses: Vec<Value> = params
            .get("to")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|r| {
                        json!({
                            "email": r.get("email").cloned().unwrap_or(Value::Null),
                            "status": "sent",
                            "reject_reason": null,
                            "_id": uuid::Uuid::new_v4().simple().to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Value::Array(statuses)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_message(&self, params: &Map<String, Value>) -> Result<Value, MandrillError> {
        self.sent.write().push(SentMessage {
            id: uuid::Uuid::new_v4().to_string(),
            params: params.clone(),
            sent_at: Utc::now(),
        });

        if let Some(error) = self.fail_with.read().clone() {
            return Err(error);
        }

        Ok(match self.response.read().clone() {
            Some(body) => body,
            None => Self::accepted_response(params),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
