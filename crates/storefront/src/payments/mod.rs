//! Payment provider integration.
//!
//! - `client` opens hosted checkout sessions (Stripe-compatible API)
//! - `webhook` verifies and parses provider event notifications

mod client;
pub mod webhook;

pub use client::{CheckoutSession, PaymentsClient, checkout_form};
pub use webhook::{WebhookError, WebhookEvent, WebhookVerifier};

use thiserror::Error;

/// Errors that can occur when talking to the payment provider.
#[derive(Debug, Error)]
pub enum PaymentsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request.
    #[error("payment provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the provider.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The provider's response could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
