//! Order metadata decoding command.
//!
//! # Usage
//!
//! ```bash
//! folio-cli metadata decode '{"v":1,"items":[{"p":"A","q":2,"a":["ecommerce"]}]}'
//! ```

use folio_core::OrderMetadata;

use super::{CliError, emit};

/// Validate and pretty-print order metadata copied from a payment.
pub fn decode(input: &str) -> Result<(), CliError> {
    let metadata = OrderMetadata::parse(input.trim())?;
    emit(&metadata)
}
