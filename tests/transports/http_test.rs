//! HttpTransport tests against a mock Mandrill API.

use std::sync::Arc;

use mandrill_relay::transport::HttpTransport;
use mandrill_relay::{MandrillConfig, MandrillError, MandrillMailer, OutboundMessage, SendDefaults};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helper Functions
// ============================================================================

fn mailer(server: &MockServer) -> MandrillMailer {
    MandrillMailer::new(MandrillConfig::new("md-test-key").base_url(server.uri()))
}

fn sent_response(emails: &[&str]) -> ResponseTemplate {
    let body: Vec<_> = emails
        .iter()
        .enumerate()
        .map(|(i, email)| {
            json!({
                "email": email,
                "status": "sent",
                "reject_reason": null,
                "_id": format!("id-{}", i)
            })
        })
        .collect();
    ResponseTemplate::new(200).set_body_json(body)
}

// ============================================================================
// Delivery
// ============================================================================

#[tokio::test]
async fn successful_send_returns_receipt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages/send.json"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "key": "md-test-key",
            "message": {
                "subject": "Hello, Avengers!",
                "from_email": "tony.stark@example.com",
                "to": [
                    {"email": "steve.rogers@example.com"},
                    {"email": "bruce.banner@example.com"}
                ],
                "text": "Hello"
            }
        })))
        .respond_with(sent_response(&[
            "steve.rogers@example.com",
            "bruce.banner@example.com",
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = mailer(&server)
        .send_plain(
            "steve.rogers@example.com, bruce.banner@example.com",
            "tony.stark@example.com",
            "Hello, Avengers!",
            "Hello",
            vec![],
            None,
        )
        .await
        .unwrap();

    assert_eq!(receipt.subject, "Hello, Avengers!");
    assert_eq!(receipt.recipients.len(), 2);
    assert_eq!(receipt.recipients[1].id.as_deref(), Some("id-1"));
    assert_eq!(receipt.rejected().count(), 0);
}

#[tokio::test]
async fn defaults_reach_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages/send.json"))
        .and(body_partial_json(json!({
            "message": {
                "tags": ["transactional", "billing"],
                "subaccount": "acme",
                "bcc_address": "archive@example.com",
                "track_opens": true
            }
        })))
        .respond_with(sent_response(&["a@example.com"]))
        .expect(1)
        .mount(&server)
        .await;

    let config = MandrillConfig::new("md-test-key")
        .base_url(server.uri())
        .defaults(
            SendDefaults::new()
                .param("track_opens", true)
                .global_tags(["transactional", "billing"])
                .subaccount("acme")
                .bcc_address("archive@example.com"),
        );
    let mailer = MandrillMailer::new(config);

    let result = mailer
        .send(
            &OutboundMessage::new()
                .to("a@example.com")
                .from("f@example.com")
                .subject("Invoice")
                .html("<p>Due</p>"),
        )
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_ignored() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages/send.json"))
        .respond_with(sent_response(&["a@example.com"]))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new("md-test-key").base_url(format!("{}/", server.uri()));
    let mailer = MandrillMailer::with_transport(MandrillConfig::new("md-test-key"), Arc::new(transport));

    let result = mailer
        .send_plain("a@example.com", "f@example.com", "Hi", "Hello", vec![], None)
        .await;
    assert!(result.is_ok());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn provider_error_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages/send.json"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": "error",
            "code": -1,
            "name": "Invalid_Key",
            "message": "Invalid API key"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = mailer(&server)
        .send_plain("a@example.com", "f@example.com", "Hi", "Hello", vec![], None)
        .await
        .unwrap_err();

    match err {
        MandrillError::ProviderError {
            name,
            message,
            status,
        } => {
            assert_eq!(name, "Invalid_Key");
            assert_eq!(message, "Invalid API key");
            assert_eq!(status, Some(500));
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn non_json_error_body_is_kept() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages/send.json"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = mailer(&server)
        .send_plain("a@example.com", "f@example.com", "Hi", "Hello", vec![], None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert!(err.to_string().contains("Bad Gateway"));
}

#[tokio::test]
async fn empty_response_is_a_failed_send() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages/send.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let err = mailer(&server)
        .send_plain("a@example.com", "f@example.com", "Hi", "Hello", vec![], None)
        .await
        .unwrap_err();
    assert!(matches!(err, MandrillError::EmptyResponse));
}

#[tokio::test]
async fn rejected_recipients_are_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages/send.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"email": "a@example.com", "status": "sent", "_id": "1"},
            {"email": "b@example.com", "status": "rejected", "reject_reason": "hard-bounce", "_id": "2"}
        ])))
        .mount(&server)
        .await;

    let receipt = mailer(&server)
        .send_plain("a@example.com,b@example.com", "f@example.com", "Hi", "Hello", vec![], None)
        .await
        .unwrap();

    let rejected: Vec<_> = receipt.rejected().collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].email, "b@example.com");
    assert_eq!(rejected[0].reject_reason.as_deref(), Some("hard-bounce"));
}
