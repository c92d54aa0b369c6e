//! Catalog validation command.
//!
//! # Usage
//!
//! ```bash
//! folio-cli catalog check catalog.json
//! ```

use std::path::Path;

use folio_core::CatalogLoad;
use serde::Serialize;

use super::{CliError, emit, load_catalog};

/// Summary of a catalog check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogReport {
    pub products: usize,
    pub addons: usize,
    pub rejected: Vec<RejectedView>,
}

/// A product left out of the catalog.
#[derive(Debug, Serialize)]
pub struct RejectedView {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub reason: String,
}

impl From<&CatalogLoad> for CatalogReport {
    fn from(load: &CatalogLoad) -> Self {
        Self {
            products: load.catalog.len(),
            addons: load
                .catalog
                .products()
                .iter()
                .map(|product| product.addons.len())
                .sum(),
            rejected: load
                .rejected
                .iter()
                .map(|rejected| RejectedView {
                    index: rejected.index,
                    id: rejected.id.clone(),
                    reason: rejected.reason.clone(),
                })
                .collect(),
        }
    }
}

/// Validate a catalog file. Fails if any product is rejected.
pub async fn check(path: &Path) -> Result<(), CliError> {
    let load = load_catalog(path).await?;
    let report = CatalogReport::from(&load);
    emit(&report)?;

    if report.rejected.is_empty() {
        tracing::info!(products = report.products, "Catalog is valid");
        Ok(())
    } else {
        Err(CliError::InvalidProducts(report.rejected.len()))
    }
}
