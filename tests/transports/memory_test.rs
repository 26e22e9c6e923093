//! MemoryTransport tests.

use std::sync::Arc;

use mandrill_relay::transport::MemoryTransport;
use mandrill_relay::{MandrillConfig, MandrillError, MandrillMailer, OutboundMessage};
use serde_json::json;

fn setup() -> (MandrillMailer, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    let mailer = MandrillMailer::with_transport(MandrillConfig::new("test-key"), transport.clone());
    (mailer, transport)
}

#[tokio::test]
async fn records_payloads_in_order() {
    let (mailer, transport) = setup();

    for subject in ["First", "Second"] {
        mailer
            .send_plain("a@example.com", "f@example.com", subject, "Body", vec![], None)
            .await
            .unwrap();
    }

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].param_str("subject"), Some("First"));
    assert_eq!(sent[1].param_str("subject"), Some("Second"));
    assert_ne!(sent[0].id, sent[1].id);
}

#[tokio::test]
async fn failure_still_records_the_call() {
    let (mailer, transport) = setup();
    transport.set_failure(MandrillError::HttpError("connection refused".into()));

    let result = mailer
        .send(&OutboundMessage::new().to("a@example.com").from("f@example.com"))
        .await;

    assert!(matches!(result, Err(MandrillError::HttpError(_))));
    assert_eq!(transport.sent_count(), 1);

    transport.reset_response();
    let result = mailer
        .send(&OutboundMessage::new().to("a@example.com").from("f@example.com"))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn scripted_response_is_returned() {
    let (mailer, transport) = setup();
    transport.respond_with(json!([
        {"email": "a@example.com", "status": "queued", "_id": "abc"}
    ]));

    let receipt = mailer
        .send(&OutboundMessage::new().to("a@example.com").from("f@example.com"))
        .await
        .unwrap();
    assert_eq!(receipt.recipients[0].status, "queued");
    assert_eq!(receipt.recipients[0].id.as_deref(), Some("abc"));
}

#[tokio::test]
async fn flush_empties_the_log() {
    let (mailer, transport) = setup();
    mailer
        .send_plain("a@example.com", "f@example.com", "Hi", "Hello", vec![], None)
        .await
        .unwrap();

    assert_eq!(transport.flush().len(), 1);
    assert_eq!(transport.sent_count(), 0);
}
