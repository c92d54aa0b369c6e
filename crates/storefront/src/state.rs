//! Application state shared across handlers.

use std::sync::Arc;

use folio_core::CheckoutSettings;

use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::payments::{PaymentsClient, WebhookVerifier};
use crate::services::CartStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the catalog cache and provider clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: CatalogClient,
    payments: PaymentsClient,
    webhooks: WebhookVerifier,
    cart_store: CartStore,
    checkout: CheckoutSettings,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let catalog = CatalogClient::new(&config.catalog);
        let payments = PaymentsClient::new(&config.payments);
        let webhooks = WebhookVerifier::new(config.payments.webhook_secret.clone());
        let cart_store = CartStore::new(config.cart_secret.clone(), config.is_secure());
        let checkout = config.checkout_settings();

        Self {
            inner: Arc::new(AppStateInner {
                catalog,
                payments,
                webhooks,
                cart_store,
                checkout,
            }),
        }
    }

    /// Get a reference to the catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the payment provider client.
    #[must_use]
    pub fn payments(&self) -> &PaymentsClient {
        &self.inner.payments
    }

    /// Get a reference to the webhook signature verifier.
    #[must_use]
    pub fn webhooks(&self) -> &WebhookVerifier {
        &self.inner.webhooks
    }

    /// Get a reference to the cart cookie store.
    #[must_use]
    pub fn cart_store(&self) -> &CartStore {
        &self.inner.cart_store
    }

    /// Checkout redirect targets and currency.
    #[must_use]
    pub fn checkout_settings(&self) -> &CheckoutSettings {
        &self.inner.checkout
    }
}
