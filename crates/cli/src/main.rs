//! Folio Shop CLI - catalog, cart and checkout tooling.
//!
//! # Usage
//!
//! ```bash
//! # Validate a catalog file
//! folio-cli catalog check catalog.json
//!
//! # Price a cart against a catalog
//! folio-cli cart quote --catalog catalog.json --cart '[{"productId":"A","quantity":2}]'
//!
//! # Show the checkout request a cart would produce
//! folio-cli checkout preview --catalog catalog.json --cart @cart.json
//!
//! # Decode order metadata from a payment
//! folio-cli metadata decode '{"v":1,"items":[{"p":"A","q":2}]}'
//! ```
//!
//! # Commands
//!
//! - `catalog check` - Validate a catalog file
//! - `cart quote` - Price a cart
//! - `checkout preview` - Build a checkout request without calling the provider
//! - `metadata decode` - Validate order metadata

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;
use commands::checkout::PreviewOptions;

#[derive(Parser)]
#[command(name = "folio-cli")]
#[command(author, version, about = "Folio Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with catalog files
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Work with carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Preview checkout requests
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Work with order metadata
    Metadata {
        #[command(subcommand)]
        action: MetadataAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Validate a catalog file
    Check {
        /// Path to the catalog JSON
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Price a cart against a catalog
    Quote {
        /// Path to the catalog JSON
        #[arg(long)]
        catalog: PathBuf,

        /// Cart JSON, or @path to a file containing it
        #[arg(long)]
        cart: String,
    },
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Build the checkout request for a cart
    Preview {
        /// Path to the catalog JSON
        #[arg(long)]
        catalog: PathBuf,

        /// Cart JSON, or @path to a file containing it
        #[arg(long)]
        cart: String,

        /// Currency code (default: `PAYMENTS_CURRENCY` or usd)
        #[arg(long)]
        currency: Option<String>,

        /// Success redirect (default: `CHECKOUT_SUCCESS_URL`)
        #[arg(long)]
        success_url: Option<String>,

        /// Cancel redirect (default: `CHECKOUT_CANCEL_URL`)
        #[arg(long)]
        cancel_url: Option<String>,

        /// Print provider form fields instead of the request
        #[arg(long)]
        form: bool,
    },
}

#[derive(Subcommand)]
enum MetadataAction {
    /// Validate and pretty-print order metadata
    Decode {
        /// Metadata JSON string
        input: String,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Check { file } => commands::catalog::check(&file).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Quote { catalog, cart } => commands::cart::quote(&catalog, &cart).await?,
        },
        Commands::Checkout { action } => match action {
            CheckoutAction::Preview {
                catalog,
                cart,
                currency,
                success_url,
                cancel_url,
                form,
            } => {
                let base_url = env_or("STOREFRONT_BASE_URL", "http://localhost:3000");
                let options = PreviewOptions {
                    currency: currency.unwrap_or_else(|| env_or("PAYMENTS_CURRENCY", "usd")),
                    success_url: success_url.unwrap_or_else(|| {
                        env_or(
                            "CHECKOUT_SUCCESS_URL",
                            &format!("{base_url}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}"),
                        )
                    }),
                    cancel_url: cancel_url
                        .unwrap_or_else(|| env_or("CHECKOUT_CANCEL_URL", &format!("{base_url}/cart"))),
                    form,
                };
                commands::checkout::preview(&catalog, &cart, &options).await?;
            }
        },
        Commands::Metadata { action } => match action {
            MetadataAction::Decode { input } => commands::metadata::decode(&input)?,
        },
    }
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
