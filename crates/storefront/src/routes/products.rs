//! Product route handlers.

use axum::{Json, extract::State};
use folio_core::Product;
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

/// List the catalog.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let snapshot = state.catalog().snapshot().await?;
    Ok(Json(snapshot.catalog.products().to_vec()))
}
