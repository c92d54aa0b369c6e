//! Folio Core - cart, pricing and checkout domain library.
//!
//! This crate holds everything about the shop that can be expressed as pure
//! data transformations:
//! - `storefront` - HTTP service that persists carts and talks to the payment provider
//! - `cli` - Operator tooling for catalogs and cart quotes
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks. Every operation here is deterministic given its inputs,
//! which keeps pricing reproducible from a raw cart and a catalog snapshot.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices and currencies
//! - [`catalog`] - Products, add-ons and tolerant catalog validation
//! - [`cart`] - The raw (persisted) cart and its mutation engine
//! - [`pricing`] - Resolving a raw cart against the catalog
//! - [`checkout`] - Building a payment-provider checkout request
//! - [`metadata`] - The versioned order summary attached to a checkout

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod metadata;
pub mod pricing;
pub mod types;

pub use cart::{CartMutation, MAX_LINE_QUANTITY, RawCart, RawCartEntry};
pub use catalog::{Addon, Catalog, CatalogLoad, CatalogParseError, Product, RejectedProduct};
pub use checkout::{
    CheckoutError, CheckoutRequest, CheckoutSettings, LineItem, METADATA_MAX_LEN,
    build_checkout_request,
};
pub use metadata::{METADATA_VERSION, MetadataError, OrderMetadata, OrderMetadataItem};
pub use pricing::{DetailedCart, DetailedCartItem, resolve};
pub use types::*;
