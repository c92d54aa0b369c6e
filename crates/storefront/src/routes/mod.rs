//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (catalog reachable)
//!
//! # Catalog
//! GET  /api/products            - Product listing
//!
//! # Cart (JSON, cart kept in a signed cookie)
//! GET  /api/cart                - Priced cart
//! POST /api/cart/add            - Add or increment {productId, quantity?, selectedAddons?}
//! POST /api/cart/quantity       - Set quantity {productId, quantity}
//! POST /api/cart/addons         - Replace add-ons {productId, selectedAddons}
//! POST /api/cart/remove         - Remove line {productId}
//! POST /api/cart/clear          - Empty the cart
//!
//! # Checkout
//! POST /api/checkout            - Open a hosted checkout session
//!
//! # Webhooks
//! POST /api/webhooks/payments   - Payment provider events
//! ```

pub mod cart;
pub mod checkout;
pub mod health;
pub mod products;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{API_POLICY, CHECKOUT_POLICY, limiter};
use crate::state::AppState;

/// Whether route groups get per-IP rate limiters.
///
/// Limiters key on proxy client-IP headers, so requests without them are
/// rejected; tests and local tools run without limiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimiting {
    Enabled,
    Disabled,
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/quantity", post(cart::set_quantity))
        .route("/addons", post(cart::set_addons))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the catalog and cart API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(products::index))
        .nest("/api/cart", cart_routes())
}

/// Create all routes for the storefront.
pub fn routes(rate_limiting: RateLimiting) -> Router<AppState> {
    let (api, checkout) = match rate_limiting {
        RateLimiting::Enabled => (
            api_routes().layer(limiter(API_POLICY)),
            post(checkout::create).layer(limiter(CHECKOUT_POLICY)),
        ),
        RateLimiting::Disabled => (api_routes(), post(checkout::create)),
    };

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(api)
        .route("/api/checkout", checkout)
        .route("/api/webhooks/payments", post(webhooks::payments))
}
