//! Extension points the dispatcher calls for each event.
//!
//! Register any number of handlers per [`Hook`]. They run in registration
//! order. A handler that returns an error or panics is logged and skipped;
//! the remaining handlers, and the rest of the batch, still run.
//!
//! # Example
//!
//! ```rust,ignore
//! use mandrill_relay::webhook::{HookRegistry, WebhookEvent};
//!
//! let mut hooks = HookRegistry::new();
//! hooks.on_message(|event| {
//!     if let WebhookEvent::Message(msg) = event {
//!         if msg.kind.is_bounce() {
//!             suppress(msg.email().unwrap_or_default())?;
//!         }
//!     }
//!     Ok(())
//! });
//! ```

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::event::WebhookEvent;

/// Error type handlers may return.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// The named extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Every event, before its category hook.
    AnyEvent,
    SyncEvent,
    InboundEvent,
    MessageEvent,
}

impl Hook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnyEvent => "any_event",
            Self::SyncEvent => "sync_event",
            Self::InboundEvent => "inbound_event",
            Self::MessageEvent => "message_event",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::AnyEvent => 0,
            Self::SyncEvent => 1,
            Self::InboundEvent => 2,
            Self::MessageEvent => 3,
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that reacts to webhook events.
///
/// Closures of the right shape implement this already; implement it on a
/// struct when the handler needs state.
///
/// ```rust,ignore
/// struct SuppressionSync { db: Pool }
///
/// impl EventHandler for SuppressionSync {
///     fn handle(&self, event: &WebhookEvent) -> Result<(), HookError> {
///         if let WebhookEvent::Sync(sync) = event {
///             self.db.record(sync.email(), sync.action())?;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &WebhookEvent) -> Result<(), HookError>;
}

/// Blanket implementation for closures.
impl<F> EventHandler for F
where
    F: Fn(&WebhookEvent) -> Result<(), HookError> + Send + Sync,
{
    fn handle(&self, event: &WebhookEvent) -> Result<(), HookError> {
        (self)(event)
    }
}

/// Registered handlers for every hook.
#[derive(Clone, Default)]
pub struct HookRegistry {
    handlers: [Vec<Arc<dyn EventHandler>>; 4],
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `hook`.
    pub fn register(&mut self, hook: Hook, handler: impl EventHandler + 'static) -> &mut Self {
        self.handlers[hook.index()].push(Arc::new(handler));
        self
    }

    /// Register a shared handler for `hook`.
    pub fn register_arc(&mut self, hook: Hook, handler: Arc<dyn EventHandler>) -> &mut Self {
        self.handlers[hook.index()].push(handler);
        self
    }

    /// Register a handler that sees every event.
    pub fn on_any<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&WebhookEvent) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.register(Hook::AnyEvent, handler)
    }

    /// Register a handler for whitelist/blacklist events.
    pub fn on_sync<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&WebhookEvent) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.register(Hook::SyncEvent, handler)
    }

    /// Register a handler for inbound mail.
    pub fn on_inbound<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&WebhookEvent) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.register(Hook::InboundEvent, handler)
    }

    /// Register a handler for message lifecycle events.
    pub fn on_message<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&WebhookEvent) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.register(Hook::MessageEvent, handler)
    }

    /// Number of handlers registered for `hook`.
    pub fn len(&self, hook: Hook) -> usize {
        self.handlers[hook.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.iter().all(Vec::is_empty)
    }

    /// Run every handler for `hook` against `event`.
    ///
    /// Returns how many handlers failed.
    pub fn run(&self, hook: Hook, event: &WebhookEvent) -> usize {
        let mut failures = 0;

        for (position, handler) in self.handlers[hook.index()].iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    tracing::error!(
                        hook = %hook,
                        handler = position,
                        event = ?event.event_type(),
                        error = %e,
                        "Webhook handler failed"
                    );
                }
                Err(panic) => {
                    failures += 1;
                    tracing::error!(
                        hook = %hook,
                        handler = position,
                        event = ?event.event_type(),
                        panic = panic_message(&*panic),
                        "Webhook handler panicked"
                    );
                }
            }
        }

        failures
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("any_event", &self.len(Hook::AnyEvent))
            .field("sync_event", &self.len(Hook::SyncEvent))
            .field("inbound_event", &self.len(Hook::InboundEvent))
            .field("message_event", &self.len(Hook::MessageEvent))
            .finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}
