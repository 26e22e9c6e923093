//! Framework-agnostic webhook handling.
//!
//! Mandrill POSTs a form with one field, `mandrill_events`, holding a JSON
//! array of events. Mandrill disables endpoints that keep failing, so the
//! answer is always `200` with an empty body, whatever the batch contained
//! and whatever the handlers did.

use serde::Serialize;
use serde_json::Value;

use super::event::{EventCategory, WebhookEvent};
use super::hooks::{Hook, HookRegistry};
use crate::config::WebhookConfig;
use crate::error::MandrillError;

/// Form field carrying the event batch.
pub const EVENTS_FIELD: &str = "mandrill_events";

/// The HTTP answer to give Mandrill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    /// `200` with an empty body.
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: String::new(),
        }
    }
}

/// What happened to one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub events: usize,
    pub sync: usize,
    pub inbound: usize,
    pub message: usize,
    pub unrecognized: usize,
    /// Handler invocations that returned an error or panicked.
    pub failed_handlers: usize,
}

/// Routes webhook events to registered hooks.
///
/// ```rust,ignore
/// let mut hooks = HookRegistry::new();
/// hooks.on_message(|event| { /* ... */ Ok(()) });
///
/// let dispatcher = Dispatcher::new(hooks);
/// let response = dispatcher.handle_incoming(&request_body);
/// assert_eq!(response.status, 200);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    hooks: HookRegistry,
    config: WebhookConfig,
}

impl Dispatcher {
    pub fn new(hooks: HookRegistry) -> Self {
        Self {
            hooks,
            config: WebhookConfig::default(),
        }
    }

    /// Attach webhook settings (signature key and URL).
    pub fn with_config(mut self, config: WebhookConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Handle a raw `application/x-www-form-urlencoded` request body.
    ///
    /// Always answers `200` with an empty body.
    pub fn handle_incoming(&self, form_body: &str) -> WebhookResponse {
        match parse_form(form_body) {
            Ok(fields) => self.handle_fields(&fields),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring undecodable webhook body");
                WebhookResponse::ok()
            }
        }
    }

    /// Handle already-decoded form fields.
    ///
    /// Always answers `200` with an empty body.
    pub fn handle_fields(&self, fields: &[(String, String)]) -> WebhookResponse {
        let events = fields
            .iter()
            .find(|(name, _)| name == EVENTS_FIELD)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.trim().is_empty());

        let Some(events) = events else {
            tracing::debug!("Webhook request without events");
            return WebhookResponse::ok();
        };

        match self.dispatch_batch(events) {
            Ok(summary) => {
                tracing::info!(
                    events = summary.events,
                    sync = summary.sync,
                    inbound = summary.inbound,
                    message = summary.message,
                    unrecognized = summary.unrecognized,
                    failed_handlers = summary.failed_handlers,
                    "Webhook batch dispatched"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed webhook batch");
            }
        }

        WebhookResponse::ok()
    }

    /// Decode a JSON event array and run the hooks for every event, in order.
    ///
    /// # Errors
    ///
    /// `JsonError` if `json` is not valid JSON or not an array. No hook runs
    /// in that case.
    pub fn dispatch_batch(&self, json: &str) -> Result<DispatchSummary, MandrillError> {
        let events = match serde_json::from_str::<Value>(json)? {
            Value::Array(events) => events,
            other => {
                return Err(MandrillError::JsonError(format!(
                    "expected an array of events, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut summary = DispatchSummary::default();
        for raw in events {
            let event = WebhookEvent::from_value(raw);
            self.dispatch(&event, &mut summary);
        }

        Ok(summary)
    }

    /// Run the any-event hook, then the category hook, for one event.
    pub fn dispatch_event(&self, event: &WebhookEvent) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        self.dispatch(event, &mut summary);
        summary
    }

    fn dispatch(&self, event: &WebhookEvent, summary: &mut DispatchSummary) {
        summary.events += 1;
        summary.failed_handlers += self.hooks.run(Hook::AnyEvent, event);

        let category = event.category();

        #[cfg(feature = "metrics")]
        metrics::counter!(
            "mandrill_webhook_events_total",
            "category" => category.map_or("unrecognized", |c| c.as_str())
        )
        .increment(1);

        let hook = match category {
            Some(EventCategory::Sync) => {
                summary.sync += 1;
                Hook::SyncEvent
            }
            Some(EventCategory::Inbound) => {
                summary.inbound += 1;
                Hook::InboundEvent
            }
            Some(EventCategory::Message) => {
                summary.message += 1;
                Hook::MessageEvent
            }
            None => {
                summary.unrecognized += 1;
                tracing::debug!(event = ?event.event_type(), "Skipping unrecognized webhook event");
                return;
            }
        };

        summary.failed_handlers += self.hooks.run(hook, event);
    }
}

/// Decode a form-encoded body into its fields, in order.
pub fn parse_form(body: &str) -> Result<Vec<(String, String)>, MandrillError> {
    Ok(serde_urlencoded::from_str(body)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
