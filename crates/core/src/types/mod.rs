//! Core value types for Folio Shop.
//!
//! This module provides type-safe wrappers for identifiers and money.

pub mod id;
pub mod price;

pub use id::{AddonId, ProductId};
pub use price::{CurrencyCode, Price, PriceError, UnsupportedCurrency};
