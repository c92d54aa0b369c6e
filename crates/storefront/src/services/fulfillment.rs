//! Order fulfillment hand-off for verified payment events.
//!
//! Fulfillment here is the point where a paid order is recorded. The order
//! summary comes back from the provider, so it is validated before use.

use folio_core::{MetadataError, OrderMetadata};
use tracing::{info, warn};

use crate::payments::WebhookEvent;

/// What happened to a verified event.
#[derive(Debug, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    /// A completed checkout with a valid order summary.
    OrderReceived {
        session_id: String,
        order: OrderMetadata,
    },
    /// A completed checkout whose order summary was missing or invalid.
    InvalidOrder { session_id: String },
    /// Payment status updates are informational.
    Informational,
    /// Unknown event types are accepted and ignored.
    Ignored,
}

/// Dispatch a verified event.
///
/// Never fails: an invalid order summary cannot be fixed by the provider
/// retrying the delivery, so it is logged and acknowledged.
#[must_use]
pub fn handle_event(event: WebhookEvent) -> FulfillmentOutcome {
    match event {
        WebhookEvent::CheckoutCompleted {
            event_id,
            session_id,
            payment_status,
            metadata,
        } => match parse_order(metadata.as_deref()) {
            Ok(order) => {
                info!(
                    event_id = %event_id,
                    session_id = %session_id,
                    payment_status = payment_status.as_deref().unwrap_or("unknown"),
                    items = order.items.len(),
                    units = order.items.iter().map(|item| item.quantity).sum::<i64>(),
                    "Order received"
                );
                FulfillmentOutcome::OrderReceived { session_id, order }
            }
            Err(reason) => {
                warn!(
                    event_id = %event_id,
                    session_id = %session_id,
                    reason = %reason,
                    "Checkout completed with invalid order metadata"
                );
                FulfillmentOutcome::InvalidOrder { session_id }
            }
        },
        WebhookEvent::PaymentSucceeded {
            event_id,
            payment_intent_id,
        } => {
            info!(event_id = %event_id, payment_intent_id = %payment_intent_id, "Payment succeeded");
            FulfillmentOutcome::Informational
        }
        WebhookEvent::PaymentFailed {
            event_id,
            payment_intent_id,
        } => {
            warn!(event_id = %event_id, payment_intent_id = %payment_intent_id, "Payment failed");
            FulfillmentOutcome::Informational
        }
        WebhookEvent::Unrecognized { event_id, kind } => {
            tracing::debug!(event_id = %event_id, kind = %kind, "Ignoring webhook event");
            FulfillmentOutcome::Ignored
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum OrderError {
    #[error("no order metadata on session")]
    Missing,
    #[error(transparent)]
    Invalid(#[from] MetadataError),
}

fn parse_order(metadata: Option<&str>) -> Result<OrderMetadata, OrderError> {
    Ok(OrderMetadata::parse(metadata.ok_or(OrderError::Missing)?)?)
}
