//! The outbound mailer.
//!
//! [`MandrillMailer`] turns conventional "send this email" calls into one
//! `messages/send` request each. Payload assembly lives in
//! [`payload`](crate::payload); the request itself goes through a
//! [`Transport`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;

#[cfg(feature = "metrics")]
use std::time::Instant;

use crate::address::{Address, Recipients};
use crate::attachment::AttachmentSource;
use crate::config::MandrillConfig;
use crate::error::MandrillError;
use crate::message::OutboundMessage;
use crate::payload::build_params;
use crate::transport::{is_truthy, recipient_statuses, RecipientStatus, Transport};

/// What a successful send reports back.
///
/// Carries the caller's recipients exactly as given (before comma
/// expansion), so callers can log or store them unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub to: Recipients,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Per-recipient outcome from Mandrill
    #[serde(default)]
    pub recipients: Vec<RecipientStatus>,
}

impl SendReceipt {
    /// Recipients Mandrill refused outright.
    pub fn rejected(&self) -> impl Iterator<Item = &RecipientStatus> {
        self.recipients.iter().filter(|r| r.is_rejected())
    }
}

/// Sends mail through Mandrill.
///
/// # Example
///
/// ```rust,ignore
/// use mandrill_relay::{MandrillConfig, MandrillMailer, SendDefaults};
///
/// let config = MandrillConfig::new("md-xxxx")
///     .defaults(SendDefaults::new().tag("transactional"));
/// let mailer = MandrillMailer::new(config);
///
/// let receipt = mailer
///     .send_plain("a@x.com,b@x.com", "noreply@x.com", "Hi", "Hello", vec![], None)
///     .await?;
/// ```
#[derive(Clone)]
pub struct MandrillMailer {
    config: Arc<MandrillConfig>,
    transport: Arc<dyn Transport>,
}

impl MandrillMailer {
    /// Create a mailer that talks to the Mandrill API over HTTPS.
    #[cfg(feature = "http")]
    pub fn new(config: impl Into<Arc<MandrillConfig>>) -> Self {
        let config = config.into();
        let transport = crate::transport::HttpTransport::from_config(&config);
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    /// Create a mailer with an explicit transport.
    pub fn with_transport(
        config: impl Into<Arc<MandrillConfig>>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config: config.into(),
            transport,
        }
    }

    /// The account configuration this mailer sends with.
    pub fn config(&self) -> &MandrillConfig {
        &self.config
    }

    /// Send a plain-text message.
    pub async fn send_plain(
        &self,
        to: impl Into<Recipients>,
        from: impl Into<Address>,
        subject: impl Into<String>,
        text: impl Into<String>,
        attachments: Vec<AttachmentSource>,
        headers: Option<BTreeMap<String, String>>,
    ) -> Result<SendReceipt, MandrillError> {
        let mut message = OutboundMessage::new()
            .to(to)
            .from(from)
            .subject(subject)
            .text(text)
            .put_headers(headers);
        message.attachments = attachments;

        self.send(&message).await
    }

    /// Send an HTML message, optionally with a plain-text alternative and
    /// inline images.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_html(
        &self,
        to: impl Into<Recipients>,
        from: impl Into<Address>,
        subject: impl Into<String>,
        html: impl Into<String>,
        attachments: Vec<AttachmentSource>,
        headers: Option<BTreeMap<String, String>>,
        text: Option<String>,
        inline_images: Vec<AttachmentSource>,
    ) -> Result<SendReceipt, MandrillError> {
        let mut message = OutboundMessage::new()
            .to(to)
            .from(from)
            .subject(subject)
            .html(html)
            .put_headers(headers);
        message.text = text;
        message.attachments = attachments;
        message.inline_images = inline_images;

        self.send(&message).await
    }

    /// Build the payload for `message` and submit it in one provider call.
    ///
    /// A failed call, a provider error, or an empty provider answer is an
    /// `Err`. Nothing is retried.
    pub async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, MandrillError> {
        let transport = self.transport.name();
        let span = tracing::info_span!(
            "mandrill.send",
            transport = transport,
            to = ?message.to,
            subject = %message.subject,
        );

        async move {
            if !message.is_valid() {
                tracing::warn!("Sending message without a sender or recipients");
            }

            let params = build_params(&self.config.defaults, message);
            tracing::debug!(keys = params.len(), "Submitting message");

            #[cfg(feature = "metrics")]
            let start = Instant::now();

            let result = self
                .transport
                .send_message(&params)
                .await
                .and_then(|body| {
                    if is_truthy(&body) {
                        Ok(body)
                    } else {
                        Err(MandrillError::EmptyResponse)
                    }
                });

            #[cfg(feature = "metrics")]
            {
                let status = if result.is_ok() { "success" } else { "error" };
                metrics::counter!("mandrill_messages_total", "transport" => transport, "status" => status)
                    .increment(1);
                metrics::histogram!("mandrill_send_duration_seconds", "transport" => transport)
                    .record(start.elapsed().as_secs_f64());
            }

            match result {
                Ok(body) => {
                    let recipients = recipient_statuses(&body);
                    let rejected = recipients.iter().filter(|r| r.is_rejected()).count();
                    tracing::info!(
                        recipients = recipients.len(),
                        rejected = rejected,
                        "Message sent"
                    );
                    Ok(SendReceipt {
                        to: message.to.clone(),
                        subject: message.subject.clone(),
                        html: message.html.clone(),
                        headers: message.headers.clone(),
                        recipients,
                    })
                }
                Err(e) => {
                    tracing::error!(error = %e, "Message send failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}
