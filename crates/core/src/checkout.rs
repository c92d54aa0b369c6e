//! Checkout request builder.
//!
//! Turns a [`DetailedCart`] into the provider-neutral shape of a hosted
//! checkout session: one line item per product, one per selected add-on, and
//! the compact order summary from [`crate::metadata`].

use serde::Serialize;
use thiserror::Error;

use crate::metadata::OrderMetadata;
use crate::pricing::DetailedCart;
use crate::types::{CurrencyCode, ProductId};

/// Longest metadata value payment providers accept.
pub const METADATA_MAX_LEN: usize = 500;

/// Errors that prevent a checkout request from being built.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to pay for.
    #[error("Your cart is empty")]
    EmptyCart,

    /// The order summary would be truncated by the provider.
    #[error("Too many different items to check out at once ({len} > {max} bytes of order data)")]
    MetadataTooLarge { len: usize, max: usize },

    /// A line quantity the provider cannot represent.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },

    /// The order summary could not be serialized.
    #[error("Failed to encode order metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Redirect targets and currency for checkout sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub currency: CurrencyCode,
    pub success_url: String,
    pub cancel_url: String,
}

/// One priced entry in a checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub currency: CurrencyCode,
    /// Unit price in minor currency units.
    pub unit_amount: i64,
    pub name: String,
    /// Omitted entirely when blank; providers reject empty descriptions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: u64,
}

/// Everything needed to open a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    pub line_items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
    /// Compact JSON from [`OrderMetadata::encode`].
    pub metadata: String,
}

impl CheckoutRequest {
    /// Total charge in minor units.
    #[must_use]
    pub fn amount_total(&self) -> i64 {
        self.line_items
            .iter()
            .map(|item| {
                item.unit_amount
                    .saturating_mul(i64::try_from(item.quantity).unwrap_or(i64::MAX))
            })
            .fold(0, i64::saturating_add)
    }
}

/// Build a checkout request from a resolved cart.
///
/// Each cart item yields a base line item at the product's price, followed by
/// one line item per selected add-on that still exists on the product, named
/// `"{addon} (Addon)"`. Add-on lines carry the parent item's quantity.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] when there are no items, and
/// [`CheckoutError::MetadataTooLarge`] when the order summary exceeds
/// [`METADATA_MAX_LEN`].
pub fn build_checkout_request(
    cart: &DetailedCart,
    settings: &CheckoutSettings,
) -> Result<CheckoutRequest, CheckoutError> {
    if cart.items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut line_items = Vec::with_capacity(cart.items.len());
    for item in &cart.items {
        let quantity = u64::try_from(item.quantity)
            .ok()
            .filter(|&quantity| quantity > 0)
            .ok_or_else(|| CheckoutError::InvalidQuantity {
                product_id: item.product.id.clone(),
                quantity: item.quantity,
            })?;

        line_items.push(LineItem {
            currency: settings.currency,
            unit_amount: item.product.price.to_minor_units(),
            name: item.product.name.clone(),
            description: non_blank(&item.product.description),
            quantity,
        });

        line_items.extend(item.addons().map(|addon| LineItem {
            currency: settings.currency,
            unit_amount: addon.price.to_minor_units(),
            name: format!("{} (Addon)", addon.name),
            description: non_blank(&addon.description),
            quantity,
        }));
    }

    let metadata = OrderMetadata::from_cart(cart).encode()?;
    if metadata.len() > METADATA_MAX_LEN {
        return Err(CheckoutError::MetadataTooLarge {
            len: metadata.len(),
            max: METADATA_MAX_LEN,
        });
    }

    Ok(CheckoutRequest {
        line_items,
        success_url: settings.success_url.clone(),
        cancel_url: settings.cancel_url.clone(),
        metadata,
    })
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cart::{RawCart, add_or_increment, set_quantity};
    use crate::catalog::Catalog;
    use crate::metadata::OrderMetadata;
    use crate::pricing::resolve;
    use crate::types::AddonId;

    fn catalog() -> Catalog {
        Catalog::from_json(&json!([
            {
                "id": "A",
                "name": "Portfolio Site",
                "description": "  ",
                "price": "30.00",
                "addons": [
                    { "id": "ecommerce", "name": "E-commerce", "description": "Online shop", "price": "15.00" }
                ]
            },
            { "id": "B", "name": "Logo", "description": "Vector logo", "price": "10.00" }
        ]))
        .unwrap()
        .catalog
    }

    fn settings() -> CheckoutSettings {
        CheckoutSettings {
            currency: CurrencyCode::USD,
            success_url: "https://example.test/checkout/success".to_string(),
            cancel_url: "https://example.test/cart".to_string(),
        }
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let err = build_checkout_request(&DetailedCart::default(), &settings()).unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(err.to_string(), "Your cart is empty");
    }

    #[test]
    fn test_product_with_addon_yields_two_line_items() {
        let catalog = catalog();
        let cart = add_or_increment(
            &RawCart::new(),
            &catalog,
            &ProductId::new("A"),
            1,
            &[AddonId::new("ecommerce")],
        );
        let cart = set_quantity(&cart, &ProductId::new("A"), 2);

        let request = build_checkout_request(&resolve(&cart, &catalog), &settings()).unwrap();

        assert_eq!(request.line_items.len(), 2);
        let base = &request.line_items[0];
        assert_eq!(base.name, "Portfolio Site");
        assert_eq!(base.unit_amount, 3000);
        assert_eq!(base.quantity, 2);
        assert_eq!(base.description, None);

        let addon = &request.line_items[1];
        assert_eq!(addon.name, "E-commerce (Addon)");
        assert_eq!(addon.unit_amount, 1500);
        assert_eq!(addon.quantity, 2);
        assert_eq!(addon.description.as_deref(), Some("Online shop"));

        assert_eq!(request.amount_total(), 9000);
        assert_eq!(request.success_url, "https://example.test/checkout/success");
        assert_eq!(request.cancel_url, "https://example.test/cart");
    }

    #[test]
    fn test_dangling_addons_get_no_line_item_but_stay_in_metadata() {
        let catalog = catalog();
        let cart = RawCart::from_untrusted(&json!([
            { "productId": "A", "quantity": 1, "selectedAddons": ["retired"] },
            { "productId": "B", "quantity": 3 }
        ]));

        let request = build_checkout_request(&resolve(&cart, &catalog), &settings()).unwrap();
        let names: Vec<&str> = request.line_items.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Portfolio Site", "Logo"]);
        assert_eq!(request.line_items[1].description.as_deref(), Some("Vector logo"));

        let metadata = OrderMetadata::parse(&request.metadata).unwrap();
        assert_eq!(metadata.items.len(), 2);
        assert_eq!(metadata.items[0].selected_addon_ids, vec![AddonId::new("retired")]);
        assert_eq!(metadata.items[1].quantity, 3);
    }

    #[test]
    fn test_metadata_round_trips_cart_contents() {
        let catalog = catalog();
        let cart = add_or_increment(
            &RawCart::new(),
            &catalog,
            &ProductId::new("A"),
            2,
            &[AddonId::new("ecommerce")],
        );
        let detailed = resolve(&cart, &catalog);
        let request = build_checkout_request(&detailed, &settings()).unwrap();

        assert_eq!(
            request.metadata,
            r#"{"v":1,"items":[{"p":"A","q":2,"a":["ecommerce"]}]}"#
        );
        assert_eq!(
            OrderMetadata::parse(&request.metadata).unwrap(),
            OrderMetadata::from_cart(&detailed)
        );
    }

    #[test]
    fn test_oversized_metadata_is_rejected() {
        let products: Vec<_> = (0..40)
            .map(|i| json!({ "id": format!("product-with-a-long-identifier-{i}"), "name": "P", "price": 1 }))
            .collect();
        let catalog = Catalog::from_json(&json!(products)).unwrap().catalog;
        let cart = RawCart::from_entries(catalog.products().iter().map(|p| crate::cart::RawCartEntry {
            product_id: p.id.clone(),
            quantity: 1,
            selected_addon_ids: vec![],
        }));

        let err = build_checkout_request(&resolve(&cart, &catalog), &settings()).unwrap_err();
        assert!(matches!(err, CheckoutError::MetadataTooLarge { max: METADATA_MAX_LEN, .. }));
    }

    #[test]
    fn test_charged_total_matches_displayed_subtotal() {
        let catalog = Catalog::from_json(&json!([
            {
                "id": "site",
                "name": "Site",
                "price": "19.99",
                "addons": [
                    { "id": "seo", "name": "SEO", "price": "0.33" },
                    { "id": "cdn", "name": "CDN", "price": "0.05" }
                ]
            },
            { "id": "icon", "name": "Icon", "price": "0.01" },
            { "id": "logo", "name": "Logo", "price": "10.10" }
        ]))
        .unwrap()
        .catalog;

        let carts = [
            json!([{ "productId": "site", "quantity": 3, "selectedAddons": ["seo"] }]),
            json!([{ "productId": "icon", "quantity": 7 }, { "productId": "logo", "quantity": 3 }]),
            json!([
                { "productId": "site", "quantity": 9999, "selectedAddons": ["seo", "cdn"] },
                { "productId": "icon", "quantity": 1 }
            ]),
        ];

        for raw in carts {
            let detailed = resolve(&RawCart::from_untrusted(&raw), &catalog);
            let request = build_checkout_request(&detailed, &settings()).unwrap();
            assert_eq!(
                Some(request.amount_total()),
                crate::types::price::minor_units(detailed.subtotal),
                "cart {raw}"
            );
        }
    }

    #[test]
    fn test_line_item_serialization_omits_missing_description() {
        let item = LineItem {
            currency: CurrencyCode::USD,
            unit_amount: 100,
            name: "Thing".to_string(),
            description: None,
            quantity: 1,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("description").is_none());
    }
}
