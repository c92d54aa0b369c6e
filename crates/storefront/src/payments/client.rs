//! Hosted checkout session client.

use std::sync::Arc;

use folio_core::CheckoutRequest;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::PaymentsError;
use crate::config::PaymentsConfig;

/// Provider metadata key holding the encoded order summary.
pub const METADATA_KEY: &str = "cart";

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the payment provider's checkout API.
#[derive(Clone)]
pub struct PaymentsClient {
    inner: Arc<PaymentsClientInner>,
}

struct PaymentsClientInner {
    client: reqwest::Client,
    endpoint: String,
    secret_key: SecretString,
}

impl std::fmt::Debug for PaymentsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentsClient")
            .field("endpoint", &self.inner.endpoint)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl PaymentsClient {
    /// Create a new payments client.
    #[must_use]
    pub fn new(config: &PaymentsConfig) -> Self {
        Self {
            inner: Arc::new(PaymentsClientInner {
                client: reqwest::Client::new(),
                endpoint: format!("{}/v1/checkout/sessions", config.api_base),
                secret_key: config.secret_key.clone(),
            }),
        }
    }

    /// Open a hosted checkout session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider rejects it.
    #[instrument(skip(self, request), fields(line_items = request.line_items.len()))]
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentsError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&checkout_form(request))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(PaymentsError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&response_text)
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or_else(|| response_text.chars().take(200).collect());
            tracing::error!(
                status = %status,
                message = %message,
                "Payment provider rejected checkout session"
            );
            return Err(PaymentsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: CheckoutSession = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse checkout session response"
            );
            e
        })?;

        debug!(session_id = %session.id, "Checkout session created");
        Ok(session)
    }
}

/// Form fields for a checkout session request, in provider bracket notation.
#[must_use]
pub fn checkout_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    let mut fields = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (format!("metadata[{METADATA_KEY}]"), request.metadata.clone()),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        let price = format!("line_items[{i}][price_data]");
        fields.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        fields.push((
            format!("{price}[currency]"),
            item.currency.as_provider_str().to_string(),
        ));
        fields.push((format!("{price}[unit_amount]"), item.unit_amount.to_string()));
        fields.push((format!("{price}[product_data][name]"), item.name.clone()));
        if let Some(description) = &item.description {
            fields.push((
                format!("{price}[product_data][description]"),
                description.clone(),
            ));
        }
    }

    fields
}
