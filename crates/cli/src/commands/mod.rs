//! CLI command implementations.
//!
//! Every command reads local files only and prints JSON to stdout, so output
//! can be piped into `jq` or diffed in CI.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod metadata;

use std::path::Path;

use folio_core::{Catalog, CatalogLoad, CatalogParseError, MetadataError, RawCart};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading an input file failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The catalog is not a product list.
    #[error(transparent)]
    Catalog(#[from] CatalogParseError),

    /// Some catalog products failed validation.
    #[error("{0} catalog product(s) failed validation")]
    InvalidProducts(usize),

    /// The cart argument is not JSON.
    #[error("cart is not valid JSON: {0}")]
    Cart(serde_json::Error),

    /// The cart cannot be checked out.
    #[error(transparent)]
    Checkout(#[from] folio_core::CheckoutError),

    /// The order metadata is invalid.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// An option has an invalid value.
    #[error("invalid {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Output(serde_json::Error),
}

/// Read a file to a string.
pub async fn read_input(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read {
            path: path.display().to_string(),
            source,
        })
}

/// Load and validate a catalog file, logging skipped products.
pub async fn load_catalog(path: &Path) -> Result<CatalogLoad, CliError> {
    let load = Catalog::from_json_str(&read_input(path).await?)?;
    for rejected in &load.rejected {
        tracing::warn!(
            index = rejected.index,
            id = rejected.id.as_deref().unwrap_or("<none>"),
            reason = %rejected.reason,
            "Skipping invalid catalog product"
        );
    }
    Ok(load)
}

/// Load a cart given inline as JSON or as `@path/to/cart.json`.
///
/// The cart is read as leniently as a cart cookie: malformed entries are
/// dropped rather than rejected.
pub async fn load_cart(arg: &str) -> Result<RawCart, CliError> {
    let json = match arg.strip_prefix('@') {
        Some(path) => read_input(Path::new(path)).await?,
        None => arg.to_string(),
    };
    parse_cart(&json)
}

fn parse_cart(json: &str) -> Result<RawCart, CliError> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(CliError::Cart)?;
    Ok(RawCart::from_untrusted(&value))
}

/// Print a value as pretty JSON on stdout.
pub fn emit(value: &impl Serialize) -> Result<(), CliError> {
    let output = serde_json::to_string_pretty(value).map_err(CliError::Output)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
    Ok(())
}
