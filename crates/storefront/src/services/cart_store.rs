//! Cookie-backed cart persistence.
//!
//! The raw cart lives entirely in one signed cookie:
//!
//! ```text
//! folio_cart=<base64url(envelope)>.<hex(hmac-sha256(secret, base64 part))>
//! ```
//!
//! where the envelope is `{"v":1,"exp":<unix seconds>,"items":[...]}`.
//! Loading never fails. A missing, tampered, expired or malformed token reads
//! as an empty cart, and individual malformed items are dropped.

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use folio_core::RawCart;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};
use tracing::debug;

use super::signing::{constant_time_compare, hmac_sha256_hex};

/// Name of the cart cookie.
pub const CART_COOKIE_NAME: &str = "folio_cart";

/// Cart lifetime, refreshed on every write.
pub const CART_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Largest `Set-Cookie` value browsers are required to keep.
pub const MAX_COOKIE_BYTES: usize = 4096;

const TOKEN_VERSION: u32 = 1;

/// Errors writing a cart token.
#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to sign cart: {0}")]
    Sign(#[from] hmac::digest::InvalidLength),
    #[error("cart cookie is not a valid header value")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
    /// A browser would silently drop the cookie.
    #[error("cart cookie is {len} bytes, limit is {max}")]
    TooLarge { len: usize, max: usize },
}

/// Reasons a presented token is ignored. Only used for debug logging.
#[derive(Debug, Error)]
enum TokenRejection {
    #[error("missing signature separator")]
    Unsigned,
    #[error("signature mismatch")]
    BadSignature,
    #[error("payload is not base64url")]
    Encoding,
    #[error("payload is not a token envelope")]
    Envelope,
    #[error("unsupported token version {0}")]
    Version(u32),
    #[error("token expired")]
    Expired,
}

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    v: u32,
    exp: i64,
    items: &'a RawCart,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    v: u32,
    exp: i64,
    #[serde(default)]
    items: Value,
}

/// Reads and writes the signed cart cookie.
#[derive(Clone)]
pub struct CartStore {
    secret: SecretString,
    secure: bool,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("secret", &"[REDACTED]")
            .field("secure", &self.secure)
            .finish()
    }
}

impl CartStore {
    /// Create a store. `secure` sets the cookie's `Secure` flag.
    #[must_use]
    pub const fn new(secret: SecretString, secure: bool) -> Self {
        Self { secret, secure }
    }

    /// Load the cart from request headers. Never fails.
    #[must_use]
    pub fn load(&self, headers: &HeaderMap) -> RawCart {
        self.load_at(headers, chrono::Utc::now().timestamp())
    }

    /// Load the cart as of the given unix time.
    #[must_use]
    pub fn load_at(&self, headers: &HeaderMap, now: i64) -> RawCart {
        let Some(token) = find_cart_cookie(headers) else {
            return RawCart::new();
        };

        match self.decode(&token, now) {
            Ok(cart) => cart,
            Err(reason) => {
                debug!(reason = %reason, "Ignoring cart cookie");
                RawCart::new()
            }
        }
    }

    /// Build the `Set-Cookie` header that persists `cart`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be encoded or signed.
    pub fn save(&self, cart: &RawCart) -> Result<HeaderValue, CartStoreError> {
        self.save_at(cart, chrono::Utc::now().timestamp())
    }

    /// Build the `Set-Cookie` header as of the given unix time.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be encoded or signed, or the cookie
    /// would exceed [`MAX_COOKIE_BYTES`].
    pub fn save_at(&self, cart: &RawCart, now: i64) -> Result<HeaderValue, CartStoreError> {
        let token = self.encode(cart, now)?;

        let cookie = Cookie::build((CART_COOKIE_NAME, token))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(CART_TTL_SECONDS))
            .build()
            .to_string();

        if cookie.len() > MAX_COOKIE_BYTES {
            return Err(CartStoreError::TooLarge {
                len: cookie.len(),
                max: MAX_COOKIE_BYTES,
            });
        }

        Ok(HeaderValue::from_str(&cookie)?)
    }

    /// Build the `Set-Cookie` header for an emptied cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be signed.
    pub fn clear(&self) -> Result<HeaderValue, CartStoreError> {
        self.save(&RawCart::new())
    }

    fn encode(&self, cart: &RawCart, now: i64) -> Result<String, CartStoreError> {
        let envelope = EnvelopeOut {
            v: TOKEN_VERSION,
            exp: now.saturating_add(CART_TTL_SECONDS),
            items: cart,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&envelope)?);
        let signature = hmac_sha256_hex(self.secret.expose_secret().as_bytes(), payload.as_bytes())?;
        Ok(format!("{payload}.{signature}"))
    }

    fn decode(&self, token: &str, now: i64) -> Result<RawCart, TokenRejection> {
        let (payload, signature) = token.rsplit_once('.').ok_or(TokenRejection::Unsigned)?;

        let expected = hmac_sha256_hex(self.secret.expose_secret().as_bytes(), payload.as_bytes())
            .map_err(|_| TokenRejection::BadSignature)?;
        if !constant_time_compare(&expected, signature) {
            return Err(TokenRejection::BadSignature);
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenRejection::Encoding)?;
        let envelope: EnvelopeIn =
            serde_json::from_slice(&bytes).map_err(|_| TokenRejection::Envelope)?;

        if envelope.v != TOKEN_VERSION {
            return Err(TokenRejection::Version(envelope.v));
        }
        if envelope.exp <= now {
            return Err(TokenRejection::Expired);
        }

        Ok(RawCart::from_untrusted(&envelope.items))
    }
}

/// First `folio_cart` value across all `Cookie` headers.
fn find_cart_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == CART_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}
