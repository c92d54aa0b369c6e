//! Cached catalog snapshot.

use chrono::{DateTime, Utc};
use folio_core::Catalog;

/// The single cache key: there is one catalog per storefront.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct CatalogKey;

/// A validated catalog together with when it was fetched.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub catalog: Catalog,
    pub fetched_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            fetched_at: Utc::now(),
        }
    }
}
