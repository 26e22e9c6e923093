//! Outbound message with builder pattern.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::{Address, Recipients};
use crate::attachment::AttachmentSource;

/// A message to send through Mandrill.
///
/// ```
/// use mandrill_relay::OutboundMessage;
///
/// let message = OutboundMessage::new()
///     .from(("Support", "support@example.com"))
///     .to("a@example.com,b@example.com")
///     .subject("Hello!")
///     .text("Plain text content")
///     .html("<h1>HTML content</h1>")
///     .header("X-Campaign", "spring");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Recipients, as given by the caller
    pub to: Recipients,
    /// Sender address
    pub from: Option<Address>,
    pub subject: String,
    /// HTML body
    pub html: Option<String>,
    /// Plain text body
    pub text: Option<String>,
    pub attachments: Vec<AttachmentSource>,
    /// Images referenced from the HTML body via `cid:`
    pub inline_images: Vec<AttachmentSource>,
    /// Custom MIME headers
    pub headers: Option<BTreeMap<String, String>>,
    /// Extra Mandrill message parameters for this call only
    /// (e.g. `track_opens`, `metadata`, `preserve_recipients`).
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl OutboundMessage {
    /// Create a new empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recipients.
    ///
    /// Accepts a single address, a comma-separated list, or structured
    /// addresses.
    pub fn to(mut self, to: impl Into<Recipients>) -> Self {
        self.to = to.into();
        self
    }

    /// Set the sender.
    pub fn from(mut self, from: impl Into<Address>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the HTML body.
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html = Some(body.into());
        self
    }

    /// Set the plain text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text = Some(body.into());
        self
    }

    /// Add an attachment.
    pub fn attachment(mut self, source: impl Into<AttachmentSource>) -> Self {
        self.attachments.push(source.into());
        self
    }

    /// Add an inline image.
    pub fn inline_image(mut self, source: impl Into<AttachmentSource>) -> Self {
        self.inline_images.push(source.into());
        self
    }

    /// Add a custom header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Replace all custom headers.
    pub fn put_headers(mut self, headers: Option<BTreeMap<String, String>>) -> Self {
        self.headers = headers;
        self
    }

    /// Set a Mandrill message parameter for this call.
    ///
    /// Overrides a configured default of the same key. The core fields
    /// (`subject`, `from_email`, `to`, bodies, tags, ...) are still set on top.
    ///
    /// ```rust,ignore
    /// OutboundMessage::new()
    ///     .param("track_clicks", true)
    ///     .param("metadata", json!({"user_id": 42}))
    /// ```
    pub fn param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Check if the message has a sender and at least one recipient.
    pub fn is_valid(&self) -> bool {
        self.from.is_some() && !self.to.is_empty()
    }
}
