//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart_store` - Signed cookie persistence for the raw cart
//! - `fulfillment` - Hand-off for verified payment events
//! - `signing` - HMAC helpers shared by cart tokens and webhooks

pub mod cart_store;
pub mod fulfillment;
pub mod signing;

pub use cart_store::{CART_COOKIE_NAME, CartStore, CartStoreError};
pub use fulfillment::{FulfillmentOutcome, handle_event};
