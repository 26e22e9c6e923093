//! Assembly of the Mandrill `message` parameter map.
//!
//! [`build_params`] turns an [`OutboundMessage`] plus the configured
//! [`SendDefaults`] into the flat JSON object Mandrill's `messages/send`
//! endpoint takes. Keys are applied in a fixed order so that later, more
//! specific values always win:
//!
//! 1. configured default parameters
//! 2. per-message parameters ([`OutboundMessage::param`])
//! 3. `subject`, `from_email`, `to`, then `from_name`
//! 4. `text`, `html`
//! 5. `tags`, `subaccount`, `bcc_address`
//! 6. `attachments`, `images`
//! 7. `headers`
//!
//! An attachment that cannot be read is logged and left out; it never stops
//! the message from being built.

use serde_json::{json, Map, Value};

use crate::attachment::{Attachment, AttachmentSource};
use crate::config::SendDefaults;
use crate::message::OutboundMessage;

/// Build the parameter map for one message.
///
/// ```
/// use mandrill_relay::{build_params, OutboundMessage, SendDefaults};
///
/// let defaults = SendDefaults::new().tag("transactional");
/// let message = OutboundMessage::new()
///     .from("f@x.com")
///     .to("a@x.com,b@x.com")
///     .subject("Hi")
///     .text("Hello");
///
/// let params = build_params(&defaults, &message);
/// assert_eq!(params["to"][1]["email"], "b@x.com");
/// assert_eq!(params["tags"][0], "transactional");
/// ```
pub fn build_params(defaults: &SendDefaults, message: &OutboundMessage) -> Map<String, Value> {
    let mut params = defaults.default_params.clone();

    for (key, value) in &message.params {
        params.insert(key.clone(), value.clone());
    }

    params.insert("subject".into(), Value::String(message.subject.clone()));
    params.insert(
        "from_email".into(),
        Value::String(
            message
                .from
                .as_ref()
                .map(|a| a.email.clone())
                .unwrap_or_default(),
        ),
    );
    params.insert("to".into(), json!(message.to.normalize()));

    // A named sender always carries `from_name`, even when the name is empty.
    if let Some(name) = message.from.as_ref().and_then(|a| a.name.as_deref()) {
        params.insert("from_name".into(), Value::String(name.to_string()));
    }

    if let Some(text) = non_empty(message.text.as_deref()) {
        params.insert("text".into(), Value::String(text.to_string()));
    }
    if let Some(html) = non_empty(message.html.as_deref()) {
        params.insert("html".into(), Value::String(html.to_string()));
    }

    if !defaults.global_tags.is_empty() {
        params.insert("tags".into(), json!(defaults.global_tags));
    }

    if let Some(subaccount) = non_empty(defaults.subaccount.as_deref()) {
        params.insert("subaccount".into(), Value::String(subaccount.to_string()));
    }

    if let Some(bcc) = non_empty(defaults.bcc_address.as_deref()) {
        params.insert("bcc_address".into(), Value::String(bcc.to_string()));
    }

    let attachments = encode_all(&message.attachments);
    if !attachments.is_empty() {
        params.insert("attachments".into(), json!(attachments));
    }

    let images = encode_all(&message.inline_images);
    if !images.is_empty() {
        params.insert("images".into(), json!(images));
    }

    if let Some(headers) = message.headers.as_ref().filter(|h| !h.is_empty()) {
        params.insert("headers".into(), json!(headers));
    }

    params
}

/// Encode every readable source, logging and skipping the rest.
pub fn encode_all(sources: &[AttachmentSource]) -> Vec<Attachment> {
    sources
        .iter()
        .filter_map(|source| match source.encode() {
            Ok(attachment) => Some(attachment),
            Err(e) => {
                tracing::warn!(
                    path = %source.path().display(),
                    error = %e,
                    "Skipping attachment that could not be encoded"
                );
                None
            }
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
