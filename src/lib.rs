//! # mandrill-relay
//!
//! Send mail through Mandrill and receive its webhooks.
//!
//! ## Sending
//!
//! ```rust,ignore
//! use mandrill_relay::{MandrillConfig, MandrillMailer};
//!
//! let mailer = MandrillMailer::new(MandrillConfig::from_env()?);
//!
//! mailer
//!     .send_plain("a@example.com,b@example.com", "noreply@example.com", "Hi", "Hello", vec![], None)
//!     .await?;
//! ```
//!
//! Every send builds one flat `message` parameter map (account defaults,
//! global tags, subaccount, BCC, attachments, headers) and makes exactly
//! one `messages/send` call. See [`build_params`] for the precedence rules.
//!
//! ## Receiving webhooks
//!
//! ```rust,ignore
//! use mandrill_relay::webhook::{Dispatcher, HookRegistry};
//!
//! let mut hooks = HookRegistry::new();
//! hooks.on_message(|event| {
//!     tracing::info!(event = ?event.event_type(), "Mandrill event");
//!     Ok(())
//! });
//!
//! let response = Dispatcher::new(hooks).handle_incoming(&form_body);
//! assert_eq!(response.status, 200);
//! ```
//!
//! ## Environment Variables
//!
//! Read by [`MandrillConfig::from_env`]:
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `MANDRILL_API_KEY` | API key (required) |
//! | `MANDRILL_BASE_URL` | API base URL (default: `https://mandrillapp.com/api/1.0`) |
//! | `MANDRILL_DEFAULT_PARAMS` | JSON object merged into every message |
//! | `MANDRILL_GLOBAL_TAGS` | Comma-separated tags added to every message |
//! | `MANDRILL_SUBACCOUNT` | Subaccount for every message |
//! | `MANDRILL_BCC_ALL` | BCC address for every message |
//! | `MANDRILL_WEBHOOK_KEY` | Webhook signing key |
//! | `MANDRILL_WEBHOOK_URL` | Webhook URL as registered with Mandrill |
//!
//! ## Feature Flags
//!
//! - `http` (default) - [`HttpTransport`](transport::HttpTransport) via reqwest
//! - `axum` - [`webhook::router`] for mounting the webhook endpoint
//! - `signature` - `X-Mandrill-Signature` verification
//! - `metrics` - counters and histograms via the `metrics` facade
//!
//! ## Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `mandrill_messages_total` | Counter | transport, status | Send attempts |
//! | `mandrill_send_duration_seconds` | Histogram | transport | Provider call duration |
//! | `mandrill_webhook_events_total` | Counter | category | Dispatched webhook events |
//!
//! Install a recorder (e.g., `metrics-exporter-prometheus`) in your app to collect them.

/// The version of the mandrill-relay crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod address;
mod attachment;
mod config;
mod error;
mod mailer;
mod message;

pub mod payload;
pub mod testing;
pub mod transport;
pub mod webhook;

pub use address::{Address, Recipients};
pub use attachment::{guess_mime_type, Attachment, AttachmentSource, UNKNOWN_MIME_TYPE};
pub use config::{MandrillConfig, SendDefaults, WebhookConfig, MANDRILL_BASE_URL};
pub use error::MandrillError;
pub use mailer::{MandrillMailer, SendReceipt};
pub use message::OutboundMessage;
pub use payload::build_params;
pub use transport::{RecipientStatus, Transport};

/// Common imports.
pub mod prelude {
    pub use crate::webhook::{Dispatcher, HookRegistry, WebhookEvent};
    pub use crate::{
        Address, AttachmentSource, MandrillConfig, MandrillError, MandrillMailer,
        OutboundMessage, Recipients, SendDefaults,
    };
}
