//! Checkout preview command.
//!
//! Builds the checkout request the storefront would send for a cart, without
//! contacting the payment provider.
//!
//! # Usage
//!
//! ```bash
//! folio-cli checkout preview --catalog catalog.json --cart @cart.json
//! folio-cli checkout preview --catalog catalog.json --cart @cart.json --form
//! ```

use std::path::Path;

use folio_core::{
    Catalog, CheckoutRequest, CheckoutSettings, CurrencyCode, RawCart, build_checkout_request,
    resolve,
};
use folio_storefront::payments::checkout_form;
use serde::Serialize;

use super::{CliError, emit, load_cart, load_catalog};

/// Options for a checkout preview.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Print provider form fields instead of the request.
    pub form: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Preview<'a> {
    request: &'a CheckoutRequest,
    amount_total: i64,
}

/// Build a checkout request for a cart.
///
/// # Errors
///
/// Returns an error for an unknown currency or a cart that cannot be checked
/// out.
pub fn preview_request(
    cart: &RawCart,
    catalog: &Catalog,
    options: &PreviewOptions,
) -> Result<CheckoutRequest, CliError> {
    let currency = options
        .currency
        .parse::<CurrencyCode>()
        .map_err(|e| CliError::InvalidArgument {
            name: "currency",
            reason: e.to_string(),
        })?;
    let settings = CheckoutSettings {
        currency,
        success_url: options.success_url.clone(),
        cancel_url: options.cancel_url.clone(),
    };

    Ok(build_checkout_request(&resolve(cart, catalog), &settings)?)
}

/// Print the checkout request for a cart.
pub async fn preview(catalog: &Path, cart: &str, options: &PreviewOptions) -> Result<(), CliError> {
    let catalog = load_catalog(catalog).await?.catalog;
    let cart = load_cart(cart).await?;
    let request = preview_request(&cart, &catalog, options)?;

    if options.form {
        let fields: Vec<[String; 2]> = checkout_form(&request)
            .into_iter()
            .map(|(key, value)| [key, value])
            .collect();
        emit(&fields)
    } else {
        emit(&Preview {
            amount_total: request.amount_total(),
            request: &request,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use folio_core::CheckoutError;

    use super::*;

    fn options(currency: &str) -> PreviewOptions {
        PreviewOptions {
            currency: currency.to_string(),
            success_url: "http://localhost:3000/checkout/success".to_string(),
            cancel_url: "http://localhost:3000/cart".to_string(),
            form: false,
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_json_str(r#"[{"id": "B", "name": "Logo", "price": "10.00"}]"#)
            .unwrap()
            .catalog
    }

    #[test]
    fn test_preview_builds_request() {
        let cart = RawCart::from_untrusted(&serde_json::json!([{ "productId": "B", "quantity": 3 }]));
        let request = preview_request(&cart, &catalog(), &options("eur")).unwrap();

        assert_eq!(request.line_items.len(), 1);
        assert_eq!(request.amount_total(), 3000);
        assert_eq!(request.line_items.first().map(|l| l.currency), Some(CurrencyCode::EUR));
    }

    #[test]
    fn test_preview_rejects_empty_cart_and_bad_currency() {
        assert!(matches!(
            preview_request(&RawCart::new(), &catalog(), &options("usd")),
            Err(CliError::Checkout(CheckoutError::EmptyCart))
        ));
        assert!(matches!(
            preview_request(&RawCart::new(), &catalog(), &options("doubloons")),
            Err(CliError::InvalidArgument { name: "currency", .. })
        ));
    }
}
