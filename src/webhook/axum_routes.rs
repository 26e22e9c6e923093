//! Axum adapter for the webhook endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Router,
};

use super::dispatcher::{Dispatcher, WebhookResponse};

/// Create the webhook router.
///
/// | Method | Path | Description |
/// |--------|------|-------------|
/// | POST | `/` | Receive a `mandrill_events` batch |
/// | GET, HEAD | `/` | Reachability check Mandrill runs when the webhook is added |
///
/// Every route answers `200` with an empty body.
///
/// Hook handlers are synchronous. Each batch is dispatched on Tokio's
/// blocking pool, so handlers may do blocking I/O (database writes, file
/// access) without stalling the runtime. The response is sent once every
/// handler for the batch has returned.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", get(ping).post(receive))
        .with_state(dispatcher)
}

/// GET / and HEAD /
async fn ping() -> StatusCode {
    StatusCode::OK
}

/// POST / - Dispatch the batch.
async fn receive(
    State(dispatcher): State<Arc<Dispatcher>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let body = String::from_utf8_lossy(&body).into_owned();

    #[cfg(feature = "signature")]
    let signature = headers
        .get(super::signature::SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(String::from);

    #[cfg(not(feature = "signature"))]
    let _ = headers;

    let dispatched = tokio::task::spawn_blocking(move || {
        #[cfg(feature = "signature")]
        let response = dispatcher.handle_signed(&body, signature.as_deref());

        #[cfg(not(feature = "signature"))]
        let response = dispatcher.handle_incoming(&body);

        status_code(&response)
    })
    .await;

    match dispatched {
        Ok(status) => status,
        Err(e) => {
            tracing::error!(error = %e, "Webhook dispatch task failed");
            StatusCode::OK
        }
    }
}

fn status_code(response: &WebhookResponse) -> StatusCode {
    StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK)
}
