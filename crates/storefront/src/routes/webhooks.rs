//! Payment provider webhook handler.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::payments::WebhookError;
use crate::payments::webhook::{SIGNATURE_HEADER, parse_event};
use crate::services::handle_event;
use crate::state::AppState;

/// Acknowledgement body.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Receive a provider event.
///
/// The signature is checked against the raw body before anything is parsed.
/// Verified events are always acknowledged, even when their content cannot be
/// fulfilled, so the provider does not retry them.
#[instrument(skip(state, headers, body), fields(event_type))]
pub async fn payments(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;

    state.webhooks().verify(signature, &body)?;
    let event = parse_event(&body)?;
    tracing::Span::current().record("event_type", event.kind());

    let outcome = handle_event(event);
    tracing::debug!(outcome = ?outcome, "Webhook handled");

    Ok(Json(WebhookAck { received: true }))
}
