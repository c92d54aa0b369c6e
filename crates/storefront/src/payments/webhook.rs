//! Webhook signature verification and event parsing.
//!
//! The provider signs each delivery with a header of the form
//! `t=<unix seconds>,v1=<hex>[,v1=<hex>...]`. The signature is an
//! HMAC-SHA256 over `"{t}.{raw body}"` with the endpoint's shared secret.
//! More than one `v1` appears while a secret is being rolled; any match
//! accepts.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use super::client::METADATA_KEY;
use crate::services::signing::{constant_time_compare, hmac_sha256_hex};

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum age (either direction) of a signed timestamp.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Errors that can occur when verifying or parsing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing signature header")]
    MissingSignature,

    #[error("malformed signature header")]
    MalformedSignature,

    #[error("signature timestamp outside tolerance")]
    TimestampOutOfTolerance,

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("invalid event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// A verified provider event, reduced to what fulfillment needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// The buyer finished a hosted checkout.
    CheckoutCompleted {
        event_id: String,
        session_id: String,
        payment_status: Option<String>,
        /// Raw order summary from the session metadata, not yet validated.
        metadata: Option<String>,
    },
    PaymentSucceeded {
        event_id: String,
        payment_intent_id: String,
    },
    PaymentFailed {
        event_id: String,
        payment_intent_id: String,
    },
    /// Any other event type; accepted and ignored.
    Unrecognized { event_id: String, kind: String },
}

impl WebhookEvent {
    /// Provider event type string.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::CheckoutCompleted { .. } => "checkout.session.completed",
            Self::PaymentSucceeded { .. } => "payment_intent.succeeded",
            Self::PaymentFailed { .. } => "payment_intent.payment_failed",
            Self::Unrecognized { kind, .. } => kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: Value,
}

#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    payment_status: Option<String>,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
}

/// Verifies webhook deliveries against the shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl WebhookVerifier {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verify a delivery against the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is malformed, the timestamp is outside
    /// [`SIGNATURE_TOLERANCE_SECS`], or no signature matches.
    pub fn verify(&self, header: &str, body: &[u8]) -> Result<(), WebhookError> {
        self.verify_at(header, body, chrono::Utc::now().timestamp())
    }

    /// Verify a delivery as of the given unix time.
    ///
    /// # Errors
    ///
    /// See [`Self::verify`].
    #[instrument(skip(self, header, body))]
    pub fn verify_at(&self, header: &str, body: &[u8], now: i64) -> Result<(), WebhookError> {
        let (timestamp, signatures) = parse_signature_header(header)?;

        if now.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
            return Err(WebhookError::TimestampOutOfTolerance);
        }

        let expected = self.sign(timestamp, body)?;
        if !signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate))
        {
            return Err(WebhookError::SignatureMismatch);
        }

        debug!("Webhook signature verified");
        Ok(())
    }

    /// Header value the provider would send for `body` at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is rejected as an HMAC key.
    pub fn signature_header(&self, timestamp: i64, body: &[u8]) -> Result<String, WebhookError> {
        Ok(format!("t={timestamp},v1={}", self.sign(timestamp, body)?))
    }

    fn sign(&self, timestamp: i64, body: &[u8]) -> Result<String, WebhookError> {
        let mut payload = format!("{timestamp}.").into_bytes();
        payload.extend_from_slice(body);
        hmac_sha256_hex(self.secret.expose_secret().as_bytes(), &payload)
            .map_err(|_| WebhookError::SignatureMismatch)
    }
}

/// Split a signature header into its timestamp and `v1` signatures.
fn parse_signature_header(header: &str) -> Result<(i64, Vec<&str>), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| WebhookError::MalformedSignature)?,
                );
            }
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok((timestamp, signatures)),
        _ => Err(WebhookError::MalformedSignature),
    }
}

/// Parse a verified event body.
///
/// # Errors
///
/// Returns an error if the body is not a provider event, or a known event's
/// object is missing required fields.
pub fn parse_event(body: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let envelope: EventEnvelope = serde_json::from_slice(body)?;
    let event_id = envelope.id;

    let event = match envelope.kind.as_str() {
        "checkout.session.completed" => {
            let session: SessionObject = serde_json::from_value(envelope.data.object)?;
            let metadata = session
                .metadata
                .as_ref()
                .and_then(|metadata| metadata.get(METADATA_KEY))
                .and_then(Value::as_str)
                .map(ToString::to_string);
            WebhookEvent::CheckoutCompleted {
                event_id,
                session_id: session.id,
                payment_status: session.payment_status,
                metadata,
            }
        }
        "payment_intent.succeeded" => {
            let intent: PaymentIntentObject = serde_json::from_value(envelope.data.object)?;
            WebhookEvent::PaymentSucceeded {
                event_id,
                payment_intent_id: intent.id,
            }
        }
        "payment_intent.payment_failed" => {
            let intent: PaymentIntentObject = serde_json::from_value(envelope.data.object)?;
            WebhookEvent::PaymentFailed {
                event_id,
                payment_intent_id: intent.id,
            }
        }
        _ => WebhookEvent::Unrecognized {
            event_id,
            kind: envelope.kind,
        },
    };

    Ok(event)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SecretString::from("whsec_test_secret".to_string()))
    }

    #[test]
    fn test_valid_signature() {
        let body = br#"{"id":"evt_1"}"#;
        let header = verifier().signature_header(NOW, body).unwrap();
        assert!(verifier().verify_at(&header, body, NOW + 10).is_ok());
    }

    #[test]
    fn test_any_v1_signature_accepts() {
        let body = br#"{"id":"evt_1"}"#;
        let good = verifier().signature_header(NOW, body).unwrap();
        let good_sig = good.split_once("v1=").unwrap().1;
        let header = format!("t={NOW},v1={},v1={good_sig}", "0".repeat(64));
        assert!(verifier().verify_at(&header, body, NOW).is_ok());
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let header = verifier().signature_header(NOW, b"original").unwrap();
        assert!(matches!(
            verifier().verify_at(&header, b"tampered", NOW),
            Err(WebhookError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let other = WebhookVerifier::new(SecretString::from("whsec_other_secret".to_string()));
        let header = other.signature_header(NOW, b"body").unwrap();
        assert!(matches!(
            verifier().verify_at(&header, b"body", NOW),
            Err(WebhookError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let header = verifier().signature_header(NOW, b"body").unwrap();
        assert!(matches!(
            verifier().verify_at(&header, b"body", NOW + SIGNATURE_TOLERANCE_SECS + 1),
            Err(WebhookError::TimestampOutOfTolerance)
        ));
        assert!(
            verifier()
                .verify_at(&header, b"body", NOW + SIGNATURE_TOLERANCE_SECS)
                .is_ok()
        );
    }

    #[test]
    fn test_extreme_timestamps_are_out_of_tolerance() {
        for header in [
            format!("t={},v1=00", i64::MIN),
            format!("t={},v1=00", i64::MAX),
            "t=-1,v1=00".to_string(),
        ] {
            assert!(
                matches!(
                    verifier().verify_at(&header, b"{}", NOW),
                    Err(WebhookError::TimestampOutOfTolerance)
                ),
                "header {header:?}"
            );
        }
        assert!(matches!(
            verifier().verify_at("t=0,v1=00", b"{}", i64::MIN),
            Err(WebhookError::TimestampOutOfTolerance)
        ));
    }

    #[test]
    fn test_malformed_headers_are_rejected() {
        for header in ["", "garbage", "t=abc,v1=00", "t=1700000000", "v1=00"] {
            assert!(
                matches!(
                    verifier().verify_at(header, b"body", NOW),
                    Err(WebhookError::MalformedSignature)
                ),
                "header {header:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_parse_checkout_completed() {
        let body = json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_test_1",
                "payment_status": "paid",
                "metadata": { "cart": r#"{"v":1,"items":[{"p":"A","q":2}]}"# }
            }}
        });
        let event = parse_event(body.to_string().as_bytes()).unwrap();

        assert_eq!(
            event,
            WebhookEvent::CheckoutCompleted {
                event_id: "evt_1".to_string(),
                session_id: "cs_test_1".to_string(),
                payment_status: Some("paid".to_string()),
                metadata: Some(r#"{"v":1,"items":[{"p":"A","q":2}]}"#.to_string()),
            }
        );
        assert_eq!(event.kind(), "checkout.session.completed");
    }

    #[test]
    fn test_parse_checkout_completed_without_metadata() {
        let body = json!({
            "id": "evt_2",
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_test_2" } }
        });
        let event = parse_event(body.to_string().as_bytes()).unwrap();
        assert!(matches!(event, WebhookEvent::CheckoutCompleted { metadata: None, .. }));
    }

    #[test]
    fn test_parse_payment_intents() {
        let body = json!({
            "id": "evt_3",
            "type": "payment_intent.payment_failed",
            "data": { "object": { "id": "pi_1" } }
        });
        assert_eq!(
            parse_event(body.to_string().as_bytes()).unwrap(),
            WebhookEvent::PaymentFailed {
                event_id: "evt_3".to_string(),
                payment_intent_id: "pi_1".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_unknown_kind() {
        let body = json!({ "id": "evt_4", "type": "customer.created", "data": { "object": {} } });
        let event = parse_event(body.to_string().as_bytes()).unwrap();
        assert_eq!(event.kind(), "customer.created");
        assert!(matches!(event, WebhookEvent::Unrecognized { .. }));
    }

    #[test]
    fn test_parse_invalid_body() {
        assert!(matches!(
            parse_event(b"not json"),
            Err(WebhookError::InvalidPayload(_))
        ));
    }
}
