//! Outbound mailer tests.
//!
//! Exercises payload assembly end to end through a `MemoryTransport`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use mandrill_relay::testing::last_sent;
use mandrill_relay::transport::MemoryTransport;
use mandrill_relay::{
    AttachmentSource, MandrillConfig, MandrillMailer, OutboundMessage, Recipients, SendDefaults,
};
use serde_json::{json, Value};

// ============================================================================
// Helper Functions
// ============================================================================

fn setup(defaults: SendDefaults) -> (MandrillMailer, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    let config = MandrillConfig::new("test-key").defaults(defaults);
    let mailer = MandrillMailer::with_transport(config, transport.clone());
    (mailer, transport)
}

/// A file in the system temp dir, removed on drop.
struct TempFile(PathBuf);

impl TempFile {
    fn new(name: &str, content: &[u8]) -> Self {
        let dir = std::env::temp_dir().join(uuid::Uuid::new_v4().to_string());
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        Self(path)
    }

    fn path(&self) -> &std::path::Path {
        &self.0
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Some(dir) = self.0.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

fn attachments(params: &serde_json::Map<String, Value>, key: &str) -> Vec<Value> {
    params
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

// ============================================================================
// Payload Properties
// ============================================================================

#[tokio::test]
async fn comma_list_becomes_one_entry_per_address() {
    let (mailer, transport) = setup(SendDefaults::new());

    mailer
        .send_plain("a@x.com, b@x.com,,c@x.com", "f@x.com", "Hi", "Hello", vec![], None)
        .await
        .unwrap();

    let sent = last_sent(&transport);
    assert_eq!(
        sent.params["to"],
        json!([{"email": "a@x.com"}, {"email": "b@x.com"}, {"email": "c@x.com"}])
    );
}

#[tokio::test]
async fn structured_recipients_pass_through() {
    let (mailer, transport) = setup(SendDefaults::new());

    let to = Recipients::List(vec![
        ("Ann", "a@x.com").into(),
        "b@x.com".into(),
    ]);
    mailer
        .send_plain(to.clone(), "f@x.com", "Hi", "Hello", vec![], None)
        .await
        .unwrap();

    let sent = last_sent(&transport);
    assert_eq!(
        sent.params["to"],
        json!([{"email": "a@x.com", "name": "Ann"}, {"email": "b@x.com"}])
    );
}

#[tokio::test]
async fn sender_name_only_when_given() {
    let (mailer, transport) = setup(SendDefaults::new());

    mailer
        .send_plain("a@x.com", "f@x.com", "Hi", "Hello", vec![], None)
        .await
        .unwrap();
    assert!(last_sent(&transport).params.get("from_name").is_none());

    mailer
        .send_plain("a@x.com", ("Support", "f@x.com"), "Hi", "Hello", vec![], None)
        .await
        .unwrap();
    let sent = last_sent(&transport);
    assert_eq!(sent.param_str("from_email"), Some("f@x.com"));
    assert_eq!(sent.param_str("from_name"), Some("Support"));

    mailer
        .send_plain("a@x.com", ("", "f@x.com"), "Hi", "Hello", vec![], None)
        .await
        .unwrap();
    assert_eq!(last_sent(&transport).param_str("from_name"), Some(""));
}

#[tokio::test]
async fn global_tags_subaccount_and_bcc_are_applied() {
    let (mailer, transport) = setup(
        SendDefaults::new()
            .tag("transactional")
            .tag("signup")
            .subaccount("acme")
            .bcc_address("archive@x.com"),
    );

    mailer
        .send_plain("a@x.com", "f@x.com", "Hi", "Hello", vec![], None)
        .await
        .unwrap();

    let sent = last_sent(&transport);
    assert_eq!(sent.params["tags"], json!(["transactional", "signup"]));
    assert_eq!(sent.param_str("subaccount"), Some("acme"));
    assert_eq!(sent.param_str("bcc_address"), Some("archive@x.com"));
}

#[tokio::test]
async fn unset_options_leave_no_keys() {
    let (mailer, transport) = setup(SendDefaults::new().subaccount(""));

    mailer
        .send_plain("a@x.com", "f@x.com", "Hi", "Hello", vec![], Some(BTreeMap::new()))
        .await
        .unwrap();

    let sent = last_sent(&transport);
    for key in ["tags", "subaccount", "bcc_address", "attachments", "images", "headers", "html"] {
        assert!(sent.params.get(key).is_none(), "unexpected key {}", key);
    }
}

#[tokio::test]
async fn default_params_are_overridden_by_computed_fields() {
    let defaults = SendDefaults::new()
        .param("track_clicks", true)
        .param("subject", "from defaults")
        .param("preserve_recipients", false);
    let (mailer, transport) = setup(defaults);

    mailer
        .send(
            &OutboundMessage::new()
                .to("a@x.com")
                .from("f@x.com")
                .subject("Real subject")
                .text("Hello")
                .param("preserve_recipients", true),
        )
        .await
        .unwrap();

    let sent = last_sent(&transport);
    assert_eq!(sent.params["track_clicks"], json!(true));
    assert_eq!(sent.params["preserve_recipients"], json!(true));
    assert_eq!(sent.param_str("subject"), Some("Real subject"));
}

#[tokio::test]
async fn headers_are_passed_through() {
    let (mailer, transport) = setup(SendDefaults::new());

    let headers = BTreeMap::from([
        ("Reply-To".to_string(), "help@x.com".to_string()),
        ("X-Campaign".to_string(), "spring".to_string()),
    ]);
    let receipt = mailer
        .send_html(
            "a@x.com",
            "f@x.com",
            "Hi",
            "<p>Hello</p>",
            vec![],
            Some(headers.clone()),
            None,
            vec![],
        )
        .await
        .unwrap();

    let sent = last_sent(&transport);
    assert_eq!(
        sent.params["headers"],
        json!({"Reply-To": "help@x.com", "X-Campaign": "spring"})
    );
    assert!(sent.params.get("text").is_none());
    assert_eq!(receipt.headers, Some(headers));
}

#[tokio::test]
async fn receipt_echoes_the_original_recipients() {
    let (mailer, _transport) = setup(SendDefaults::new());

    let receipt = mailer
        .send_html(
            "a@x.com,b@x.com",
            "f@x.com",
            "Subject",
            "<p>Body</p>",
            vec![],
            None,
            Some("Body".into()),
            vec![],
        )
        .await
        .unwrap();

    assert_eq!(receipt.to, Recipients::Single("a@x.com,b@x.com".into()));
    assert_eq!(receipt.subject, "Subject");
    assert_eq!(receipt.html.as_deref(), Some("<p>Body</p>"));
}

// ============================================================================
// Attachments
// ============================================================================

#[tokio::test]
async fn file_attachment_is_encoded() {
    let (mailer, transport) = setup(SendDefaults::new());
    let file = TempFile::new("report.pdf", b"%PDF-1.4 fake");

    mailer
        .send_plain(
            "a@x.com",
            "f@x.com",
            "Report",
            "Attached",
            vec![AttachmentSource::file(file.path())],
            None,
        )
        .await
        .unwrap();

    let sent = last_sent(&transport);
    let list = attachments(&sent.params, "attachments");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "report.pdf");
    assert_eq!(list[0]["type"], "application/pdf");
    assert_eq!(
        list[0]["content"],
        base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4 fake")
    );
}

#[tokio::test]
async fn upload_keeps_its_original_name() {
    let (mailer, transport) = setup(SendDefaults::new());
    let tmp = TempFile::new("php8f2a", b"\x89PNG");

    mailer
        .send_plain(
            "a@x.com",
            "f@x.com",
            "Photo",
            "See attached",
            vec![AttachmentSource::upload(tmp.path(), "holiday.png")],
            None,
        )
        .await
        .unwrap();

    let list = attachments(&last_sent(&transport).params, "attachments");
    assert_eq!(list[0]["name"], "holiday.png");
    assert_eq!(list[0]["type"], "image/png");
}

#[tokio::test]
async fn mime_override_and_unknown_extension() {
    let (mailer, transport) = setup(SendDefaults::new());
    let custom = TempFile::new("data.bin", b"1");
    let unknown = TempFile::new("notes.zzqx", b"2");

    mailer
        .send_plain(
            "a@x.com",
            "f@x.com",
            "Files",
            "Two files",
            vec![
                AttachmentSource::file(custom.path())
                    .filename("export.csv")
                    .mime_type("text/x-custom"),
                AttachmentSource::file(unknown.path()),
            ],
            None,
        )
        .await
        .unwrap();

    let list = attachments(&last_sent(&transport).params, "attachments");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["name"], "export.csv");
    assert_eq!(list[0]["type"], "text/x-custom");
    assert_eq!(list[1]["name"], "notes.zzqx");
    assert_eq!(list[1]["type"], "application/unknown");
}

#[tokio::test]
async fn missing_file_is_skipped_and_send_happens_once() {
    let (mailer, transport) = setup(SendDefaults::new());
    let present = TempFile::new("ok.txt", b"here");
    let missing = std::env::temp_dir()
        .join(uuid::Uuid::new_v4().to_string())
        .join("gone.txt");

    mailer
        .send_plain(
            "a@x.com",
            "f@x.com",
            "Files",
            "Body",
            vec![
                AttachmentSource::file(missing),
                AttachmentSource::file(present.path()),
            ],
            None,
        )
        .await
        .unwrap();

    assert_eq!(transport.sent_count(), 1);
    let list = attachments(&last_sent(&transport).params, "attachments");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "ok.txt");
    assert_eq!(list[0]["type"], "text/plain");
}

#[tokio::test]
async fn inline_images_go_to_images() {
    let (mailer, transport) = setup(SendDefaults::new());
    let logo = TempFile::new("logo.png", b"\x89PNG");

    mailer
        .send_html(
            "a@x.com",
            "f@x.com",
            "Hi",
            r#"<img src="cid:logo.png">"#,
            vec![],
            None,
            None,
            vec![AttachmentSource::file(logo.path())],
        )
        .await
        .unwrap();

    let sent = last_sent(&transport);
    assert!(sent.params.get("attachments").is_none());
    let images = attachments(&sent.params, "images");
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["name"], "logo.png");
    assert_eq!(images[0]["type"], "image/png");
}
