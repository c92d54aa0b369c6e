//! Pricing resolver: joins a raw cart against a catalog snapshot.
//!
//! The detailed cart is always derived, never stored. Resolving on every read
//! means a price change in the catalog shows up in the next subtotal instead
//! of drifting away from a stored total.

use rust_decimal::Decimal;

use crate::cart::RawCart;
use crate::catalog::{Addon, Catalog, Product};
use crate::types::AddonId;
use crate::types::price::round_money;

/// A raw cart line resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedCartItem {
    pub product: Product,
    /// Always `> 0`.
    pub quantity: i64,
    /// The selection as stored, including ids that no longer resolve.
    pub selected_addon_ids: Vec<AddonId>,
}

impl DetailedCartItem {
    /// Selected add-ons that still exist on the product, in selection order.
    pub fn addons(&self) -> impl Iterator<Item = &Addon> {
        self.product.selected_addons(&self.selected_addon_ids)
    }

    /// Price of one unit: the product plus every resolved add-on.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.addons()
            .fold(self.product.price.amount(), |total, addon| {
                total + addon.price.amount()
            })
    }

    /// Unrounded line total: `unit_price * quantity`.
    ///
    /// Add-ons are charged per unit of the parent product, so selecting an
    /// add-on on a line of three triples its contribution.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }
}

/// A cart in display- and pricing-ready form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailedCart {
    pub items: Vec<DetailedCartItem>,
    /// Sum of line totals, rounded to 2 dp (half away from zero).
    pub subtotal: Decimal,
    /// Sum of item quantities; add-ons do not count as separate items.
    pub total_item_count: i64,
}

impl DetailedCart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Resolve a raw cart against the current catalog.
///
/// Entries whose product is missing from the catalog, or whose quantity is
/// not positive, are skipped. Dangling add-on ids contribute nothing.
#[must_use]
pub fn resolve(cart: &RawCart, catalog: &Catalog) -> DetailedCart {
    let items: Vec<DetailedCartItem> = cart
        .iter()
        .filter(|entry| entry.quantity > 0)
        .filter_map(|entry| {
            catalog
                .get(entry.product_id.as_str())
                .map(|product| DetailedCartItem {
                    product: product.clone(),
                    quantity: entry.quantity,
                    selected_addon_ids: entry.selected_addon_ids.clone(),
                })
        })
        .collect();

    let subtotal = round_money(items.iter().map(DetailedCartItem::line_total).sum());
    let total_item_count = items.iter().map(|item| item.quantity).sum();

    DetailedCart {
        items,
        subtotal,
        total_item_count,
    }
}
