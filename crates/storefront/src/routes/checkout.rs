//! Checkout route handler.
//!
//! Prices the cart against the current catalog and opens a hosted checkout
//! session. The cart cookie is left untouched whether or not this succeeds;
//! it is emptied only when the buyer chooses to.

use axum::{Json, extract::State, http::HeaderMap};
use folio_core::{build_checkout_request, resolve};
use serde::Serialize;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::state::AppState;

/// Where to send the buyer to pay.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

/// Start a hosted checkout for the current cart.
#[instrument(skip(state, headers))]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CheckoutResponse>> {
    let cart = state.cart_store().load(&headers);
    let snapshot = state.catalog().snapshot().await?;
    let detailed = resolve(&cart, &snapshot.catalog);

    let request = build_checkout_request(&detailed, state.checkout_settings())?;
    let session = state.payments().create_checkout_session(&request).await?;

    add_breadcrumb("checkout", "Checkout session created", Some(&[("session_id", session.id.as_str())]));
    tracing::info!(
        session_id = %session.id,
        items = detailed.items.len(),
        amount_total = request.amount_total(),
        "Checkout started"
    );

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}
