//! Typed view over Mandrill webhook events.
//!
//! Mandrill delivers events as loosely-shaped JSON objects whose only common
//! field is `event`. [`WebhookEvent`] sorts them into the three categories
//! the dispatcher routes on and keeps the raw record alongside, so handlers
//! can read any field Mandrill sends, including ones added after this crate
//! was written.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// The three handling pipelines an event can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Whitelist/blacklist changes.
    Sync,
    /// Mail received on an inbound domain.
    Inbound,
    /// Lifecycle of a message sent through Mandrill.
    Message,
}

impl EventCategory {
    /// Classify an `event` discriminator.
    ///
    /// First match wins, in the order Sync, Inbound, Message. Unknown event
    /// types return `None`.
    ///
    /// ```
    /// use mandrill_relay::webhook::EventCategory;
    ///
    /// assert_eq!(EventCategory::classify("blacklist"), Some(EventCategory::Sync));
    /// assert_eq!(EventCategory::classify("inbound"), Some(EventCategory::Inbound));
    /// assert_eq!(EventCategory::classify("hard_bounce"), Some(EventCategory::Message));
    /// assert_eq!(EventCategory::classify("deferral_v2"), None);
    /// ```
    pub fn classify(event: &str) -> Option<Self> {
        if SyncKind::parse(event).is_some() {
            Some(Self::Sync)
        } else if event == INBOUND_EVENT {
            Some(Self::Inbound)
        } else if MessageKind::parse(event).is_some() {
            Some(Self::Message)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Inbound => "inbound",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const INBOUND_EVENT: &str = "inbound";

/// Sync event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Whitelist,
    Blacklist,
}

impl SyncKind {
    pub fn parse(event: &str) -> Option<Self> {
        match event {
            "whitelist" => Some(Self::Whitelist),
            "blacklist" => Some(Self::Blacklist),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
        }
    }
}

/// Message lifecycle event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Send,
    HardBounce,
    SoftBounce,
    Open,
    Click,
    Spam,
    Unsub,
    Reject,
}

impl MessageKind {
    // `inbound` is deliberately absent: it is always an Inbound event.
    pub fn parse(event: &str) -> Option<Self> {
        match event {
            "send" => Some(Self::Send),
            "hard_bounce" => Some(Self::HardBounce),
            "soft_bounce" => Some(Self::SoftBounce),
            "open" => Some(Self::Open),
            "click" => Some(Self::Click),
            "spam" => Some(Self::Spam),
            "unsub" => Some(Self::Unsub),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::HardBounce => "hard_bounce",
            Self::SoftBounce => "soft_bounce",
            Self::Open => "open",
            Self::Click => "click",
            Self::Spam => "spam",
            Self::Unsub => "unsub",
            Self::Reject => "reject",
        }
    }

    /// Hard and soft bounces.
    pub fn is_bounce(&self) -> bool {
        matches!(self, Self::HardBounce | Self::SoftBounce)
    }
}

/// A whitelist or blacklist change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncEvent {
    pub kind: SyncKind,
    pub raw: Value,
}

impl SyncEvent {
    /// `add`, `remove`, or `change`.
    pub fn action(&self) -> Option<&str> {
        str_at(&self.raw, &["action"])
    }

    /// The affected address (`reject.email` for blacklist, `entry.email` for whitelist).
    pub fn email(&self) -> Option<&str> {
        str_at(&self.raw, &["reject", "email"]).or_else(|| str_at(&self.raw, &["entry", "email"]))
    }
}

/// Mail received on an inbound route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboundEvent {
    pub raw: Value,
}

impl InboundEvent {
    /// The address the mail was sent to.
    pub fn email(&self) -> Option<&str> {
        str_at(&self.raw, &["msg", "email"])
    }

    pub fn from_email(&self) -> Option<&str> {
        str_at(&self.raw, &["msg", "from_email"])
    }

    pub fn subject(&self) -> Option<&str> {
        str_at(&self.raw, &["msg", "subject"])
    }

    /// The full received MIME message.
    pub fn raw_message(&self) -> Option<&str> {
        str_at(&self.raw, &["msg", "raw_msg"])
    }
}

/// An outbound message lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageEvent {
    pub kind: MessageKind,
    pub raw: Value,
}

impl MessageEvent {
    /// Mandrill's message ID.
    pub fn message_id(&self) -> Option<&str> {
        str_at(&self.raw, &["_id"]).or_else(|| str_at(&self.raw, &["msg", "_id"]))
    }

    /// The recipient this event is about.
    pub fn email(&self) -> Option<&str> {
        str_at(&self.raw, &["msg", "email"])
    }

    pub fn subject(&self) -> Option<&str> {
        str_at(&self.raw, &["msg", "subject"])
    }

    /// The clicked URL, for click events.
    pub fn url(&self) -> Option<&str> {
        str_at(&self.raw, &["url"])
    }

    /// Bounce classification (e.g. `bad_mailbox`), for bounces.
    pub fn bounce_description(&self) -> Option<&str> {
        str_at(&self.raw, &["msg", "bounce_description"])
    }

    /// The remote server's diagnostic, for bounces.
    pub fn diag(&self) -> Option<&str> {
        str_at(&self.raw, &["msg", "diag"])
    }

    /// Tags the message was sent with.
    pub fn tags(&self) -> Vec<&str> {
        self.raw
            .pointer("/msg/tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// One decoded webhook event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WebhookEvent {
    Sync(SyncEvent),
    Inbound(InboundEvent),
    Message(MessageEvent),
    /// Anything else, including records without an `event` field.
    Unrecognized(Value),
}

impl WebhookEvent {
    /// Classify a raw event record.
    pub fn from_value(raw: Value) -> Self {
        let event = raw.get("event").and_then(Value::as_str).unwrap_or_default();

        match EventCategory::classify(event) {
            Some(EventCategory::Sync) => match SyncKind::parse(event) {
                Some(kind) => Self::Sync(SyncEvent { kind, raw }),
                None => Self::Unrecognized(raw),
            },
            Some(EventCategory::Inbound) => Self::Inbound(InboundEvent { raw }),
            Some(EventCategory::Message) => match MessageKind::parse(event) {
                Some(kind) => Self::Message(MessageEvent { kind, raw }),
                None => Self::Unrecognized(raw),
            },
            None => Self::Unrecognized(raw),
        }
    }

    /// The routing category, or `None` for unrecognized events.
    pub fn category(&self) -> Option<EventCategory> {
        match self {
            Self::Sync(_) => Some(EventCategory::Sync),
            Self::Inbound(_) => Some(EventCategory::Inbound),
            Self::Message(_) => Some(EventCategory::Message),
            Self::Unrecognized(_) => None,
        }
    }

    /// The raw event record as Mandrill sent it.
    pub fn raw(&self) -> &Value {
        match self {
            Self::Sync(e) => &e.raw,
            Self::Inbound(e) => &e.raw,
            Self::Message(e) => &e.raw,
            Self::Unrecognized(raw) => raw,
        }
    }

    /// The `event` discriminator, if present.
    pub fn event_type(&self) -> Option<&str> {
        str_at(self.raw(), &["event"])
    }

    /// When Mandrill recorded the event (`ts`, seconds since the epoch).
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let ts = self.raw().get("ts")?;
        let secs = ts.as_i64().or_else(|| ts.as_f64().map(|f| f as i64))?;
        DateTime::from_timestamp(secs, 0)
    }
}

impl From<Value> for WebhookEvent {
    fn from(raw: Value) -> Self {
        Self::from_value(raw)
    }
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |node, key| node.get(key))
        .and_then(Value::as_str)
}
