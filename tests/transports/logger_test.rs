//! LoggerTransport tests.

use std::sync::Arc;

use mandrill_relay::transport::LoggerTransport;
use mandrill_relay::{MandrillConfig, MandrillMailer};

#[tokio::test]
async fn logger_reports_every_recipient_queued() {
    let mailer = MandrillMailer::with_transport(
        MandrillConfig::new("unused"),
        Arc::new(LoggerTransport::new()),
    );

    let receipt = mailer
        .send_plain("a@example.com,b@example.com", "f@example.com", "Hi", "Hello", vec![], None)
        .await
        .unwrap();

    assert_eq!(receipt.recipients.len(), 2);
    assert!(receipt.recipients.iter().all(|r| r.status == "queued"));
    assert!(receipt.recipients.iter().all(|r| r.id.is_some()));
}

#[tokio::test]
async fn full_logger_sends_html() {
    let mailer = MandrillMailer::with_transport(
        MandrillConfig::new("unused"),
        Arc::new(LoggerTransport::full()),
    );

    let result = mailer
        .send_html(
            "a@example.com",
            "f@example.com",
            "Hi",
            "<p>Hello</p>",
            vec![],
            None,
            None,
            vec![],
        )
        .await;
    assert!(result.is_ok());
}
