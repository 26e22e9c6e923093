//! The single provider call behind every send.
//!
//! # Why `async_trait`?
//!
//! [`MandrillMailer`](crate::MandrillMailer) holds its transport as
//! `Arc<dyn Transport>` so the same mailer code runs against the real API,
//! an in-memory recorder in tests, or a logger in staging. Native async
//! traits are not object-safe, so the trait goes through `async_trait` and
//! pays one boxed future per call. Sending is network-bound; the allocation
//! does not show up.
//!
//! ## Available Transports
//!
//! | Transport | Feature Flag | Description |
//! |-----------|-------------|-------------|
//! | [`HttpTransport`] | `http` | Mandrill `messages/send` over HTTPS |
//! | [`MemoryTransport`] | (none) | Records payloads for tests |
//! | [`LoggerTransport`] | (none) | Logs payloads without sending |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MandrillError;

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::HttpTransport;

mod memory;
pub use memory::{MemoryTransport, SentMessage};

mod logger;
pub use logger::LoggerTransport;

/// Submits one assembled `message` parameter map to Mandrill.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the message and return Mandrill's response body.
    ///
    /// Transport-level and provider-level failures are `Err`. An `Ok` body
    /// is still checked by the mailer; an empty or `false` body counts as a
    /// failed send.
    async fn send_message(&self, params: &Map<String, Value>) -> Result<Value, MandrillError>;

    /// Transport name (for logging/debugging).
    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// Per-recipient outcome reported by `messages/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientStatus {
    pub email: String,
    /// `sent`, `queued`, `scheduled`, `rejected`, or `invalid`
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
    /// Mandrill's message ID for this recipient
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RecipientStatus {
    /// True when Mandrill refused this recipient.
    pub fn is_rejected(&self) -> bool {
        matches!(self.status.as_str(), "rejected" | "invalid")
    }
}

/// Whether a provider response counts as a successful send.
///
/// `null`, `false`, empty strings, empty arrays and empty objects do not.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Pull recipient statuses out of a `messages/send` response.
///
/// Entries that don't look like statuses are ignored.
pub(crate) fn recipient_statuses(value: &Value) -> Vec<RecipientStatus> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
