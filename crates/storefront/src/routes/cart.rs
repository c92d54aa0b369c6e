//! Cart route handlers.
//!
//! The cart lives in a signed cookie. Each handler reads it once, applies at
//! most one mutation, writes it back once and returns the re-priced cart.
//! Concurrent tabs are last-write-wins.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use folio_core::{
    AddonId, Catalog, CartMutation, DetailedCart, DetailedCartItem, Product, ProductId, RawCart,
    price::format_amount, resolve,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Add-on display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonView {
    pub id: AddonId,
    pub name: String,
    pub price: String,
}

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub quantity: i64,
    /// Product price without add-ons.
    pub price: String,
    /// Product plus resolved add-ons, per unit.
    pub unit_price: String,
    pub line_total: String,
    /// Resolved add-ons only.
    pub addons: Vec<AddonView>,
    /// The stored selection, including ids no longer in the catalog.
    pub selected_addons: Vec<AddonId>,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub total_item_count: i64,
}

impl From<&DetailedCartItem> for CartItemView {
    fn from(item: &DetailedCartItem) -> Self {
        Self {
            product_id: item.product.id.clone(),
            name: item.product.name.clone(),
            description: item.product.description.clone(),
            image: item.product.image.clone(),
            quantity: item.quantity,
            price: item.product.price.to_string(),
            unit_price: format_amount(item.unit_price()),
            line_total: format_amount(item.line_total()),
            addons: item
                .addons()
                .map(|addon| AddonView {
                    id: addon.id.clone(),
                    name: addon.name.clone(),
                    price: addon.price.to_string(),
                })
                .collect(),
            selected_addons: item.selected_addon_ids.clone(),
        }
    }
}

impl From<&DetailedCart> for CartView {
    fn from(cart: &DetailedCart) -> Self {
        Self {
            items: cart.items.iter().map(CartItemView::from).collect(),
            subtotal: format_amount(cart.subtotal),
            total_item_count: cart.total_item_count,
        }
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

const fn default_quantity() -> i64 {
    1
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub selected_addons: Vec<String>,
}

/// Set-quantity request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Set-add-ons request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAddonsRequest {
    pub product_id: String,
    pub selected_addons: Vec<String>,
}

/// Remove-item request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub product_id: String,
}

// =============================================================================
// Validation
// =============================================================================

fn product_id(raw: &str) -> Result<ProductId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("productId is required".to_string()));
    }
    Ok(ProductId::new(trimmed))
}

fn catalog_product<'a>(catalog: &'a Catalog, id: &ProductId) -> Result<&'a Product> {
    catalog
        .get(id.as_str())
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {id}")))
}

/// Every requested add-on must exist on the product.
fn addon_ids(product: &Product, requested: &[String]) -> Result<Vec<AddonId>> {
    requested
        .iter()
        .map(|raw| {
            product
                .addon(raw.trim())
                .map(|addon| addon.id.clone())
                .ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Unknown add-on '{}' for product {}",
                        raw.trim(),
                        product.id
                    ))
                })
        })
        .collect()
}

// =============================================================================
// Response
// =============================================================================

/// Persist the cart and respond with its priced view.
fn commit(state: &AppState, cart: &RawCart, catalog: &Catalog) -> Result<Response> {
    let cookie = state.cart_store().save(cart)?;
    let view = CartView::from(&resolve(cart, catalog));
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(view)).into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// Get the priced cart.
#[instrument(skip(state, headers))]
pub async fn show(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<CartView>> {
    let cart = state.cart_store().load(&headers);
    let snapshot = state.catalog().snapshot().await?;
    Ok(Json(CartView::from(&resolve(&cart, &snapshot.catalog))))
}

/// Add a product, or bump/reconfigure the existing line.
#[instrument(skip(state, headers, payload))]
pub async fn add(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload?;
    let product_id = product_id(&body.product_id)?;
    if body.quantity < 1 {
        return Err(AppError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }

    let snapshot = state.catalog().snapshot().await?;
    let product = catalog_product(&snapshot.catalog, &product_id)?;
    let selected_addon_ids = addon_ids(product, &body.selected_addons)?;

    let quantity = body.quantity.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str()), ("quantity", quantity.as_str())]),
    );

    let cart = state.cart_store().load(&headers).apply(
        &snapshot.catalog,
        &CartMutation::AddOrIncrement {
            product_id,
            quantity: body.quantity,
            selected_addon_ids,
        },
    );
    commit(&state, &cart, &snapshot.catalog)
}

/// Set a line's quantity exactly. Zero or less removes the line.
#[instrument(skip(state, headers, payload))]
pub async fn set_quantity(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<SetQuantityRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload?;
    let product_id = product_id(&body.product_id)?;

    let snapshot = state.catalog().snapshot().await?;
    if body.quantity > 0 {
        catalog_product(&snapshot.catalog, &product_id)?;
    }

    let cart = state.cart_store().load(&headers).apply(
        &snapshot.catalog,
        &CartMutation::SetQuantity {
            product_id,
            quantity: body.quantity,
        },
    );
    commit(&state, &cart, &snapshot.catalog)
}

/// Replace a line's add-on selection.
#[instrument(skip(state, headers, payload))]
pub async fn set_addons(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<SetAddonsRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload?;
    let product_id = product_id(&body.product_id)?;

    let snapshot = state.catalog().snapshot().await?;
    let product = catalog_product(&snapshot.catalog, &product_id)?;
    let selected_addon_ids = addon_ids(product, &body.selected_addons)?;

    let cart = state.cart_store().load(&headers).apply(
        &snapshot.catalog,
        &CartMutation::SetAddons {
            product_id,
            selected_addon_ids,
        },
    );
    commit(&state, &cart, &snapshot.catalog)
}

/// Remove a line.
#[instrument(skip(state, headers, payload))]
pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<RemoveItemRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload?;
    let product_id = product_id(&body.product_id)?;

    let snapshot = state.catalog().snapshot().await?;
    let cart = state
        .cart_store()
        .load(&headers)
        .apply(&snapshot.catalog, &CartMutation::Remove { product_id });
    commit(&state, &cart, &snapshot.catalog)
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Result<Response> {
    let cookie = state.cart_store().clear()?;
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(CartView::from(&DetailedCart::default())),
    )
        .into_response())
}
