//! Catalog model: products, add-ons and validation of untrusted catalog data.
//!
//! The catalog is owned by an external product service. Whatever it returns is
//! treated as untrusted: [`Catalog::from_json`] validates each product
//! independently and reports the ones it had to skip, so a single bad record
//! never takes the whole storefront down.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{AddonId, Price, ProductId};

/// An optional, priced sub-selection attached to a product line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addon {
    /// Unique within the parent product's add-on list.
    pub id: AddonId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price per unit of the parent product's quantity.
    pub price: Price,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    /// Image reference (URL or asset path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Ordered add-on list, possibly empty.
    #[serde(default)]
    pub addons: Vec<Addon>,
}

impl Product {
    /// Look up one of this product's add-ons by id.
    #[must_use]
    pub fn addon(&self, id: &str) -> Option<&Addon> {
        self.addons.iter().find(|addon| addon.id.as_str() == id)
    }

    /// Whether the product offers any add-ons at all.
    #[must_use]
    pub fn has_addons(&self) -> bool {
        !self.addons.is_empty()
    }

    /// Resolve a selection against this product, skipping dangling ids.
    pub fn selected_addons<'a>(
        &'a self,
        selection: &'a [AddonId],
    ) -> impl Iterator<Item = &'a Addon> + 'a {
        selection.iter().filter_map(|id| self.addon(id.as_str()))
    }

    /// Structural checks serde cannot express.
    ///
    /// Blank ids or names reject the product. Add-ons with a blank id or
    /// name are dropped, as are repeated add-on ids (first one wins).
    fn validated(mut self) -> Result<Self, String> {
        if self.id.is_blank() {
            return Err("product id is blank".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("product name is blank".to_string());
        }

        let mut seen = HashSet::new();
        self.addons.retain(|addon| {
            !addon.id.is_blank()
                && !addon.name.trim().is_empty()
                && seen.insert(addon.id.clone())
        });

        Ok(self)
    }
}

/// Errors that make a catalog payload unusable as a whole.
#[derive(Debug, Error)]
pub enum CatalogParseError {
    /// The payload is not valid JSON.
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is JSON but not a list of products.
    #[error("catalog must be a JSON array of products (got {0})")]
    NotAnArray(&'static str),
}

/// A product record that failed validation and was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedProduct {
    /// Position in the source array.
    pub index: usize,
    /// The record's `id`, if it had a readable one.
    pub id: Option<String>,
    /// Human-readable reason.
    pub reason: String,
}

/// Result of loading a catalog from untrusted JSON.
#[derive(Debug, Clone, Default)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    pub rejected: Vec<RejectedProduct>,
}

/// An immutable snapshot of the product catalog, indexed by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog from already-validated products.
    ///
    /// If two products share an id, the first one wins.
    #[must_use]
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalog = Self::default();
        for product in products {
            catalog.push(product);
        }
        catalog
    }

    fn push(&mut self, product: Product) -> bool {
        if self.index.contains_key(&product.id) {
            return false;
        }
        self.index.insert(product.id.clone(), self.products.len());
        self.products.push(product);
        true
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.index
            .get(id)
            .and_then(|&position| self.products.get(position))
    }

    /// All products, in source order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Parse and validate a catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not JSON or not a product list.
    pub fn from_json_str(input: &str) -> Result<CatalogLoad, CatalogParseError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json(&value)
    }

    /// Validate an untrusted catalog payload.
    ///
    /// Accepts either a bare array of products or an object with a
    /// `products` array. Each element is validated on its own; elements that
    /// fail are reported in [`CatalogLoad::rejected`] instead of failing the
    /// whole load.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogParseError::NotAnArray`] if no product list is found.
    pub fn from_json(value: &Value) -> Result<CatalogLoad, CatalogParseError> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("products") {
                Some(Value::Array(items)) => items,
                _ => return Err(CatalogParseError::NotAnArray("object")),
            },
            other => return Err(CatalogParseError::NotAnArray(json_kind(other))),
        };

        let mut load = CatalogLoad::default();
        for (index, item) in items.iter().enumerate() {
            let id = item
                .get("id")
                .and_then(Value::as_str)
                .map(ToString::to_string);

            let product = serde_json::from_value::<Product>(item.clone())
                .map_err(|e| e.to_string())
                .and_then(Product::validated);

            match product {
                Ok(product) => {
                    if !load.catalog.push(product) {
                        load.rejected.push(RejectedProduct {
                            index,
                            id,
                            reason: "duplicate product id".to_string(),
                        });
                    }
                }
                Err(reason) => load.rejected.push(RejectedProduct { index, id, reason }),
            }
        }

        Ok(load)
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
