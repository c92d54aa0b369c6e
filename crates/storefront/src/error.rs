//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Errors are rendered as `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use folio_core::CheckoutError;
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::payments::{PaymentsError, WebhookError};
use crate::services::CartStoreError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog could not be loaded.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Payment provider operation failed.
    #[error("Payments error: {0}")]
    Payments(#[from] PaymentsError),

    /// Checkout could not be built from the cart.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Webhook delivery failed verification or parsing.
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    /// Cart cookie could not be written.
    #[error("Cart store error: {0}")]
    CartStore(#[from] CartStoreError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::CartStore(CartStoreError::TooLarge { .. }) => StatusCode::BAD_REQUEST,
            Self::CartStore(_) | Self::Checkout(CheckoutError::Metadata(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Checkout(_)
            | Self::BadRequest(_)
            | Self::Webhook(WebhookError::InvalidPayload(_)) => StatusCode::BAD_REQUEST,
            Self::Catalog(_) | Self::Payments(_) => StatusCode::BAD_GATEWAY,
            Self::Webhook(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if matches!(self, Self::Webhook(_)) {
            tracing::warn!(error = %self, "Rejected webhook delivery");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::CartStore(CartStoreError::TooLarge { .. }) => {
                "Your cart is full; remove an item before adding more".to_string()
            }
            Self::CartStore(_) | Self::Checkout(CheckoutError::Metadata(_)) => {
                "Internal server error".to_string()
            }
            Self::Catalog(_) => "Product catalog is unavailable".to_string(),
            Self::Payments(_) => "Payment provider error".to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Webhook(WebhookError::InvalidPayload(_)) => "Invalid webhook payload".to_string(),
            Self::Webhook(_) => "Invalid webhook signature".to_string(),
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
