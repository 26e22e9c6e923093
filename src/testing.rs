//! Testing utilities and assertion helpers.
//!
//! Assertions over what a [`MemoryTransport`] captured. Failures print a
//! summary of everything that was submitted.
//!
//! # Example
//!
//! ```rust,ignore
//! use mandrill_relay::testing::*;
//! use mandrill_relay::transport::MemoryTransport;
//!
//! #[tokio::test]
//! async fn test_welcome_flow() {
//!     let transport = Arc::new(MemoryTransport::new());
//!     let mailer = MandrillMailer::with_transport(config, transport.clone());
//!
//!     // ... trigger email sending ...
//!
//!     assert_sent(&transport);
//!     assert_sent_to(&transport, "user@example.com");
//!     assert_subject_contains(&transport, "Welcome");
//!     assert_tag(&transport, "onboarding");
//!     refute_sent_to(&transport, "admin@example.com");
//! }
//! ```

use serde_json::Value;

use crate::transport::{MemoryTransport, SentMessage};

fn format_summary(sent: &[SentMessage]) -> String {
    if sent.is_empty() {
        return "  (nothing sent)".to_string();
    }

    sent.iter()
        .enumerate()
        .map(|(i, message)| {
            format!(
                "  {}. To: [{}], From: {}, Subject: \"{}\"",
                i + 1,
                message.recipients().join(", "),
                message.param_str("from_email").unwrap_or("<none>"),
                message.param_str("subject").unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn sent_to(message: &SentMessage, email: &str) -> bool {
    message
        .recipients()
        .iter()
        .any(|r| r.eq_ignore_ascii_case(email))
}

/// The most recent capture.
///
/// # Panics
///
/// Panics if nothing was sent.
pub fn last_sent(transport: &MemoryTransport) -> SentMessage {
    match transport.last_sent() {
        Some(message) => message,
        None => panic!("Expected at least one message to be sent, but none were sent"),
    }
}

/// Assert that at least one message was sent.
pub fn assert_sent(transport: &MemoryTransport) {
    assert!(
        transport.sent_count() > 0,
        "Expected at least one message to be sent, but none were sent"
    );
}

/// Assert that nothing was sent.
pub fn assert_nothing_sent(transport: &MemoryTransport) {
    let sent = transport.sent();
    assert!(
        sent.is_empty(),
        "Expected no messages to be sent, but {} were sent.\n\nSent:\n{}",
        sent.len(),
        format_summary(&sent)
    );
}

/// Assert that exactly `expected` messages were sent.
pub fn assert_sent_count(transport: &MemoryTransport, expected: usize) {
    let sent = transport.sent();
    assert!(
        sent.len() == expected,
        "Expected {} message(s) to be sent, but {} were sent.\n\nSent:\n{}",
        expected,
        sent.len(),
        format_summary(&sent)
    );
}

/// Assert that some message listed `email` in its `to` parameter.
pub fn assert_sent_to(transport: &MemoryTransport, email: &str) {
    let sent = transport.sent();
    assert!(
        sent.iter().any(|m| sent_to(m, email)),
        "Expected a message to be sent to '{}'.\n\nSent:\n{}",
        email,
        format_summary(&sent)
    );
}

/// Assert that no message listed `email` in its `to` parameter.
pub fn refute_sent_to(transport: &MemoryTransport, email: &str) {
    let sent = transport.sent();
    if let Some(found) = sent.iter().find(|m| sent_to(m, email)) {
        panic!(
            "Expected no message to be sent to '{}', but found one with subject \"{}\".\n\nSent:\n{}",
            email,
            found.param_str("subject").unwrap_or(""),
            format_summary(&sent)
        );
    }
}

/// Assert that some message had exactly this subject.
pub fn assert_subject(transport: &MemoryTransport, subject: &str) {
    let sent = transport.sent();
    assert!(
        sent.iter().any(|m| m.param_str("subject") == Some(subject)),
        "Expected a message with subject '{}'.\n\nSent:\n{}",
        subject,
        format_summary(&sent)
    );
}

/// Assert that some message's subject contains `text`.
pub fn assert_subject_contains(transport: &MemoryTransport, text: &str) {
    let sent = transport.sent();
    assert!(
        sent.iter()
            .any(|m| m.param_str("subject").is_some_and(|s| s.contains(text))),
        "Expected a message with subject containing '{}'.\n\nSent:\n{}",
        text,
        format_summary(&sent)
    );
}

/// Assert that the last message's `html` contains `text`.
pub fn assert_html_contains(transport: &MemoryTransport, text: &str) {
    let last = last_sent(transport);
    let html = last.param_str("html").unwrap_or("");
    assert!(
        html.contains(text),
        "Expected HTML body to contain '{}'.\n\nHTML body (first 500 chars):\n{}",
        text,
        html.chars().take(500).collect::<String>()
    );
}

/// Assert that the last message's `text` contains `text`.
pub fn assert_text_contains(transport: &MemoryTransport, text: &str) {
    let last = last_sent(transport);
    let body = last.param_str("text").unwrap_or("");
    assert!(
        body.contains(text),
        "Expected text body to contain '{}'.\n\nText body (first 500 chars):\n{}",
        text,
        body.chars().take(500).collect::<String>()
    );
}

/// Assert that the last message carried `key` with exactly `expected`.
pub fn assert_param(transport: &MemoryTransport, key: &str, expected: impl Into<Value>) {
    let last = last_sent(transport);
    let expected = expected.into();
    assert!(
        last.params.get(key) == Some(&expected),
        "Expected parameter '{}' to be {}, but it was {}",
        key,
        expected,
        last.params
            .get(key)
            .map_or_else(|| "missing".to_string(), Value::to_string)
    );
}

/// Assert that the last message did not carry `key` at all.
pub fn refute_param(transport: &MemoryTransport, key: &str) {
    let last = last_sent(transport);
    if let Some(value) = last.params.get(key) {
        panic!("Expected no '{}' parameter, but found {}", key, value);
    }
}

/// Assert that the last message was tagged with `tag`.
pub fn assert_tag(transport: &MemoryTransport, tag: &str) {
    let last = last_sent(transport);
    let tags: Vec<&str> = last
        .params
        .get("tags")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    assert!(
        tags.contains(&tag),
        "Expected tag '{}', but tags were {:?}",
        tag,
        tags
    );
}

/// Assert that the last message had an attachment named `name`.
pub fn assert_attachment_named(transport: &MemoryTransport, name: &str) {
    let last = last_sent(transport);
    let names: Vec<&str> = last
        .params
        .get("attachments")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|a| a.get("name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    assert!(
        names.contains(&name),
        "Expected an attachment named '{}', but attachments were {:?}",
        name,
        names
    );
}

/// Return and remove everything captured so far.
pub fn flush_sent(transport: &MemoryTransport) -> Vec<SentMessage> {
    transport.flush()
}
