//! Health check handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Readiness report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_fetched_at: Option<DateTime<Utc>>,
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the catalog can be loaded and reports how many products the
/// cached snapshot holds and when it was fetched.
/// Returns 503 Service Unavailable if it cannot.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    match state.catalog().snapshot().await {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(Readiness {
                status: "ready",
                products: Some(snapshot.catalog.len()),
                catalog_fetched_at: Some(snapshot.fetched_at),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Readiness {
                    status: "unavailable",
                    products: None,
                    catalog_fetched_at: None,
                }),
            )
        }
    }
}
