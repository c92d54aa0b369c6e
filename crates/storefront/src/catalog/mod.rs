//! Product catalog client.
//!
//! Reads the catalog from a local JSON file or an HTTP catalog service and
//! keeps one validated snapshot in a `moka` cache. The snapshot expires after
//! the configured TTL; concurrent misses share a single fetch.

mod cache;

pub use cache::CatalogSnapshot;

use std::path::Path;
use std::sync::Arc;

use folio_core::{Catalog, CatalogParseError};
use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{CatalogConfig, CatalogSource};

use cache::CatalogKey;

/// Errors that can occur when fetching the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request to the catalog service failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog service answered with a non-success status.
    #[error("catalog service returned HTTP {0}")]
    Status(u16),

    /// Reading the catalog file failed.
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// The payload is not a product list.
    #[error(transparent)]
    Parse(#[from] CatalogParseError),

    /// A fetch shared with other waiters failed.
    #[error("catalog unavailable: {0}")]
    Unavailable(Arc<Self>),
}

/// Client for the product catalog.
///
/// Cheaply cloneable; clones share the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    source: CatalogSource,
    cache: Cache<CatalogKey, Arc<CatalogSnapshot>>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                source: config.source.clone(),
                cache,
            }),
        }
    }

    /// Current catalog snapshot, fetching it if the cached one has expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched or is not a product
    /// list.
    pub async fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        self.inner
            .cache
            .try_get_with(CatalogKey, async {
                let catalog = self.fetch().await?;
                Ok::<_, CatalogError>(Arc::new(CatalogSnapshot::new(catalog)))
            })
            .await
            .map_err(CatalogError::Unavailable)
    }

    /// Drop the cached snapshot so the next read refetches.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate(&CatalogKey).await;
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Catalog, CatalogError> {
        let body = match &self.inner.source {
            CatalogSource::Http(url) => self.fetch_http(url).await?,
            CatalogSource::File(path) => read_file(path).await?,
        };

        let load = Catalog::from_json_str(&body)?;
        for rejected in &load.rejected {
            warn!(
                index = rejected.index,
                id = rejected.id.as_deref().unwrap_or("<none>"),
                reason = %rejected.reason,
                "Skipping invalid catalog product"
            );
        }

        debug!(
            products = load.catalog.len(),
            rejected = load.rejected.len(),
            "Catalog fetched"
        );
        Ok(load.catalog)
    }

    async fn fetch_http(&self, url: &Url) -> Result<String, CatalogError> {
        let response = self
            .inner
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, url = %url, "Catalog service returned non-success status");
            return Err(CatalogError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

async fn read_file(path: &Path) -> Result<String, CatalogError> {
    Ok(tokio::fs::read_to_string(path).await?)
}
