//! Cart mutation engine.
//!
//! Every operation takes the cart by reference and returns a new cart; the
//! input is never modified. All operations are total: they cannot fail, they
//! only produce a cart that may differ from what the caller expected.

use crate::catalog::{Catalog, Product};
use crate::types::{AddonId, ProductId};

use super::{MAX_LINE_QUANTITY, RawCart, RawCartEntry, dedupe_selection};

/// A single requested change to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartMutation {
    /// Add a product, or bump/reconfigure the existing line.
    AddOrIncrement {
        product_id: ProductId,
        quantity: i64,
        selected_addon_ids: Vec<AddonId>,
    },
    /// Set a line's quantity exactly (upsert; `<= 0` removes).
    SetQuantity { product_id: ProductId, quantity: i64 },
    /// Replace a line's add-on selection.
    SetAddons {
        product_id: ProductId,
        selected_addon_ids: Vec<AddonId>,
    },
    /// Remove a line.
    Remove { product_id: ProductId },
    /// Empty the cart.
    Clear,
}

impl RawCart {
    /// Apply a mutation, returning the resulting cart.
    ///
    /// The catalog is only consulted by [`CartMutation::AddOrIncrement`], to
    /// decide whether re-adding a product reconfigures or increments it.
    #[must_use]
    pub fn apply(&self, catalog: &Catalog, mutation: &CartMutation) -> Self {
        match mutation {
            CartMutation::AddOrIncrement {
                product_id,
                quantity,
                selected_addon_ids,
            } => add_or_increment(self, catalog, product_id, *quantity, selected_addon_ids),
            CartMutation::SetQuantity {
                product_id,
                quantity,
            } => set_quantity(self, product_id, *quantity),
            CartMutation::SetAddons {
                product_id,
                selected_addon_ids,
            } => set_addons(self, product_id, selected_addon_ids),
            CartMutation::Remove { product_id } => remove_item(self, product_id),
            CartMutation::Clear => clear(self),
        }
    }
}

/// Add a product to the cart, or merge into its existing line.
///
/// - No line yet: append `{product_id, quantity, selection}`.
/// - Line exists, the product offers add-ons, and a non-empty selection was
///   supplied: the selection replaces the old one and the quantity is left
///   alone. Re-adding with a fresh add-on choice reconfigures the line.
/// - Otherwise the quantity is incremented; a non-empty selection still
///   overwrites the old one, an empty selection keeps it.
///
/// Lines whose resulting quantity is `<= 0` are pruned. A product missing
/// from the catalog counts as having no add-ons.
#[must_use]
pub fn add_or_increment(
    cart: &RawCart,
    catalog: &Catalog,
    product_id: &ProductId,
    quantity: i64,
    selected_addon_ids: &[AddonId],
) -> RawCart {
    let selection = dedupe_selection(selected_addon_ids);
    let mut entries = cart.entries().to_vec();

    if let Some(entry) = entries.iter_mut().find(|e| e.product_id == *product_id) {
        let offers_addons = catalog
            .get(product_id.as_str())
            .is_some_and(Product::has_addons);

        if offers_addons && !selection.is_empty() {
            entry.selected_addon_ids = selection;
        } else {
            entry.quantity = entry
                .quantity
                .saturating_add(quantity)
                .min(MAX_LINE_QUANTITY);
            if !selection.is_empty() {
                entry.selected_addon_ids = selection;
            }
        }
    } else {
        entries.push(RawCartEntry {
            product_id: product_id.clone(),
            quantity,
            selected_addon_ids: selection,
        });
    }

    RawCart::from_entries(entries)
}

/// Set a line's quantity to exactly `quantity`.
///
/// `quantity <= 0` removes the line. A positive quantity for a product not in
/// the cart creates the line with no add-ons. The add-on selection of an
/// existing line is untouched.
#[must_use]
pub fn set_quantity(cart: &RawCart, product_id: &ProductId, quantity: i64) -> RawCart {
    if quantity <= 0 {
        return remove_item(cart, product_id);
    }

    let mut entries = cart.entries().to_vec();
    if let Some(entry) = entries.iter_mut().find(|e| e.product_id == *product_id) {
        entry.quantity = quantity;
    } else {
        entries.push(RawCartEntry {
            product_id: product_id.clone(),
            quantity,
            selected_addon_ids: Vec::new(),
        });
    }

    RawCart::from_entries(entries)
}

/// Replace the add-on selection of an existing line. No-op if absent.
#[must_use]
pub fn set_addons(cart: &RawCart, product_id: &ProductId, selected_addon_ids: &[AddonId]) -> RawCart {
    let entries = cart.iter().map(|entry| {
        if entry.product_id == *product_id {
            RawCartEntry {
                selected_addon_ids: dedupe_selection(selected_addon_ids),
                ..entry.clone()
            }
        } else {
            entry.clone()
        }
    });
    RawCart::from_entries(entries)
}

/// Remove a line. No-op if absent.
#[must_use]
pub fn remove_item(cart: &RawCart, product_id: &ProductId) -> RawCart {
    RawCart::from_entries(
        cart.iter()
            .filter(|entry| entry.product_id != *product_id)
            .cloned(),
    )
}

/// Empty the cart.
#[must_use]
pub const fn clear(_cart: &RawCart) -> RawCart {
    RawCart::new()
}
