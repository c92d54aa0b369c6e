//! Versioned order summary attached to a checkout session.
//!
//! The summary travels through the payment provider and comes back on the
//! completion webhook, so fulfillment can see exactly what was bought without
//! re-reading a cart that may have changed since. Whatever comes back is
//! untrusted and is validated by [`OrderMetadata::parse`].
//!
//! Wire format (compact keys keep it under provider size limits):
//!
//! ```json
//! {"v":1,"items":[{"p":"A","q":2,"a":["ecommerce"]}]}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::DetailedCart;
use crate::types::{AddonId, ProductId};

/// Current metadata format version.
pub const METADATA_VERSION: u32 = 1;

/// Errors that can occur when decoding order metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Not valid JSON, or the wrong shape.
    #[error("invalid order metadata: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Written by a format version this build does not understand.
    #[error("unsupported order metadata version {0}")]
    UnsupportedVersion(u32),

    /// No items at all.
    #[error("order metadata contains no items")]
    Empty,

    /// An item has a blank product id.
    #[error("order metadata item {index} has a blank product id")]
    BlankProductId { index: usize },

    /// An item has a non-positive quantity.
    #[error("order metadata item {index} has non-positive quantity {quantity}")]
    NonPositiveQuantity { index: usize, quantity: i64 },
}

/// One purchased line: product, quantity and the add-ons chosen for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMetadataItem {
    #[serde(rename = "p")]
    pub product_id: ProductId,
    #[serde(rename = "q")]
    pub quantity: i64,
    #[serde(rename = "a", default, skip_serializing_if = "Vec::is_empty")]
    pub selected_addon_ids: Vec<AddonId>,
}

/// Compact summary of a cart at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMetadata {
    #[serde(rename = "v")]
    pub version: u32,
    pub items: Vec<OrderMetadataItem>,
}

impl OrderMetadata {
    /// Summarize a detailed cart.
    #[must_use]
    pub fn from_cart(cart: &DetailedCart) -> Self {
        Self {
            version: METADATA_VERSION,
            items: cart
                .items
                .iter()
                .map(|item| OrderMetadataItem {
                    product_id: item.product.id.clone(),
                    quantity: item.quantity,
                    selected_addon_ids: item.selected_addon_ids.clone(),
                })
                .collect(),
        }
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode and validate metadata received back from the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is malformed, has an unknown version,
    /// has no items, or has an item with a blank id or non-positive quantity.
    pub fn parse(input: &str) -> Result<Self, MetadataError> {
        let metadata: Self = serde_json::from_str(input)?;

        if metadata.version != METADATA_VERSION {
            return Err(MetadataError::UnsupportedVersion(metadata.version));
        }
        if metadata.items.is_empty() {
            return Err(MetadataError::Empty);
        }
        for (index, item) in metadata.items.iter().enumerate() {
            if item.product_id.is_blank() {
                return Err(MetadataError::BlankProductId { index });
            }
            if item.quantity <= 0 {
                return Err(MetadataError::NonPositiveQuantity {
                    index,
                    quantity: item.quantity,
                });
            }
        }

        Ok(metadata)
    }
}
