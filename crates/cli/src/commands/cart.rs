//! Cart quote command.
//!
//! # Usage
//!
//! ```bash
//! folio-cli cart quote --catalog catalog.json --cart '[{"productId":"A","quantity":2}]'
//! folio-cli cart quote --catalog catalog.json --cart @cart.json
//! ```

use std::path::Path;

use folio_core::{Catalog, RawCart, resolve};
use folio_storefront::routes::cart::CartView;

use super::{CliError, emit, load_cart, load_catalog};

/// Price a cart exactly as the storefront would.
#[must_use]
pub fn quote_cart(cart: &RawCart, catalog: &Catalog) -> CartView {
    CartView::from(&resolve(cart, catalog))
}

/// Print a priced quote for a cart.
pub async fn quote(catalog: &Path, cart: &str) -> Result<(), CliError> {
    let catalog = load_catalog(catalog).await?.catalog;
    let cart = load_cart(cart).await?;

    let view = quote_cart(&cart, &catalog);
    if view.items.len() < cart.len() {
        tracing::warn!(
            requested = cart.len(),
            priced = view.items.len(),
            "Some cart lines are not in the catalog and were skipped"
        );
    }
    emit(&view)
}
