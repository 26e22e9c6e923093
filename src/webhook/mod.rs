//! Inbound Mandrill webhooks.
//!
//! Mandrill reports message activity, inbound mail and allow/deny list
//! changes by POSTing batches of events to your endpoint. This module
//! decodes those batches and hands each event to the handlers you
//! registered:
//!
//! | Hook | Receives |
//! |------|----------|
//! | [`Hook::AnyEvent`] | every event, first |
//! | [`Hook::SyncEvent`] | `whitelist` and `blacklist` events |
//! | [`Hook::InboundEvent`] | `inbound` events |
//! | [`Hook::MessageEvent`] | `send`, `hard_bounce`, `soft_bounce`, `open`, `click`, `spam`, `unsub`, `reject` |
//!
//! The endpoint always answers `200` with an empty body.
//!
//! # Example
//!
//! ```rust,ignore
//! use mandrill_relay::webhook::{Dispatcher, HookRegistry};
//!
//! let mut hooks = HookRegistry::new();
//! hooks.on_inbound(|event| {
//!     tracing::info!(event = ?event.event_type(), "Got mail");
//!     Ok(())
//! });
//!
//! let dispatcher = Dispatcher::new(hooks);
//! let response = dispatcher.handle_incoming(&form_body);
//! ```
//!
//! With the `axum` feature, mount [`router`] instead of calling the
//! dispatcher yourself:
//!
//! ```rust,ignore
//! let app = axum::Router::new()
//!     .nest("/hooks/mandrill", mandrill_relay::webhook::router(Arc::new(dispatcher)));
//! ```

mod dispatcher;
mod event;
mod hooks;

#[cfg(feature = "signature")]
pub mod signature;

#[cfg(feature = "axum")]
mod axum_routes;

pub use dispatcher::{parse_form, DispatchSummary, Dispatcher, WebhookResponse, EVENTS_FIELD};
pub use event::{
    EventCategory, InboundEvent, MessageEvent, MessageKind, SyncEvent, SyncKind, WebhookEvent,
};
pub use hooks::{EventHandler, Hook, HookError, HookRegistry};

#[cfg(feature = "axum")]
pub use axum_routes::router;

/// Axum types used with [`router`], for callers without a direct `axum` dependency.
#[cfg(feature = "axum")]
pub mod reexports {
    pub use axum::body::Body;
    pub use axum::http::{Method, Request, StatusCode};
    pub use axum::response::Response;
    pub use axum::Router;
}
