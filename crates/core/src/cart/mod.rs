//! The raw cart: the minimal persisted representation of cart contents.
//!
//! A raw cart holds product ids, quantities and add-on choices only. It knows
//! nothing about prices; see [`crate::pricing`] for resolving it against the
//! catalog.
//!
//! # Invariants
//!
//! Every [`RawCart`] value, however it was built, satisfies:
//! - at most one entry per product id (first occurrence wins)
//! - every quantity is in `1..=MAX_LINE_QUANTITY`
//! - add-on selections contain no repeated ids (first occurrence wins)

mod ops;

pub use ops::{CartMutation, add_or_increment, clear, remove_item, set_addons, set_quantity};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{AddonId, ProductId};

/// Largest quantity a single cart line may hold.
///
/// Larger requested quantities are clamped down to this value.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// One line of the raw cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartEntry {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default, rename = "selectedAddons")]
    pub selected_addon_ids: Vec<AddonId>,
}

impl RawCartEntry {
    /// Validate one untrusted persisted element.
    ///
    /// Requires an object with a non-blank string `productId` and a numeric
    /// `quantity` (integral floats such as `2.0` are accepted). Non-string
    /// add-on ids are dropped from the selection.
    fn from_untrusted(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let product_id = object.get("productId")?.as_str()?;
        if product_id.trim().is_empty() {
            return None;
        }

        let quantity = object.get("quantity").and_then(integral_number)?;

        let selected_addon_ids = object
            .get("selectedAddons")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(AddonId::from)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            product_id: ProductId::new(product_id),
            quantity,
            selected_addon_ids,
        })
    }
}

/// Read a JSON number as an integer, accepting integral floats.
fn integral_number(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let n = value.as_f64()?;
    if !n.is_finite() || n.fract() != 0.0 || n.abs() >= 9.0e15 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)] // integral and range-checked above
    let n = n as i64;
    Some(n)
}

/// Ordered list of cart entries, unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RawCartEntry>", into = "Vec<RawCartEntry>")]
pub struct RawCart(Vec<RawCartEntry>);

impl RawCart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a cart from arbitrary entries, enforcing the cart invariants.
    ///
    /// Entries with quantity `<= 0` are pruned, quantities above
    /// [`MAX_LINE_QUANTITY`] are clamped, and repeated product or add-on ids
    /// keep only their first occurrence.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = RawCartEntry>) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|entry| entry.quantity > 0)
            .filter(|entry| seen.insert(entry.product_id.clone()))
            .map(|entry| RawCartEntry {
                quantity: entry.quantity.min(MAX_LINE_QUANTITY),
                selected_addon_ids: dedupe_selection(&entry.selected_addon_ids),
                product_id: entry.product_id,
            })
            .collect();
        Self(entries)
    }

    /// Validate an untrusted persisted payload.
    ///
    /// Never fails: anything that is not a list yields an empty cart, and
    /// list elements that fail validation are silently dropped.
    #[must_use]
    pub fn from_untrusted(value: &Value) -> Self {
        value.as_array().map_or_else(Self::new, |items| {
            Self::from_entries(items.iter().filter_map(RawCartEntry::from_untrusted))
        })
    }

    #[must_use]
    pub fn entries(&self) -> &[RawCartEntry] {
        &self.0
    }

    /// The entry for a product, if present.
    #[must_use]
    pub fn entry(&self, product_id: &str) -> Option<&RawCartEntry> {
        self.0
            .iter()
            .find(|entry| entry.product_id.as_str() == product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawCartEntry> {
        self.0.iter()
    }
}

impl From<Vec<RawCartEntry>> for RawCart {
    fn from(entries: Vec<RawCartEntry>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<RawCart> for Vec<RawCartEntry> {
    fn from(cart: RawCart) -> Self {
        cart.0
    }
}

impl<'a> IntoIterator for &'a RawCart {
    type Item = &'a RawCartEntry;
    type IntoIter = std::slice::Iter<'a, RawCartEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Remove repeated add-on ids, keeping the first occurrence of each.
pub(crate) fn dedupe_selection(selection: &[AddonId]) -> Vec<AddonId> {
    let mut seen = HashSet::new();
    let mut deduped = Vec::with_capacity(selection.len());
    for id in selection {
        if seen.insert(id.as_str()) {
            deduped.push(id.clone());
        }
    }
    deduped
}
