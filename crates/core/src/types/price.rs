//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are held in major currency units (dollars, not cents) as
//! [`Decimal`]. Every place money is rounded goes through [`round_money`],
//! which rounds to two decimal places with midpoints away from zero
//! (`2.345 -> 2.35`, `-2.345 -> -2.35`).

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The amount has fractions of a cent.
    #[error("price must be a whole number of cents (got {0})")]
    SubCent(Decimal),
    /// The amount exceeds what the payment provider accepts for one unit.
    #[error("price must be at most {max} (got {got})")]
    TooLarge {
        /// Maximum allowed amount.
        max: Decimal,
        /// Amount that was supplied.
        got: Decimal,
    },
}

/// A non-negative unit price in major currency units.
///
/// ## Constraints
///
/// - `0 <= amount <= 999_999.99` (the provider's per-unit ceiling of
///   `99_999_999` minor units)
/// - at most two significant decimal places (`30.000` is fine, `0.333` is
///   not), so a unit price is always an exact number of minor units
///
/// ## Examples
///
/// ```
/// use folio_core::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(3000, 2)).unwrap();
/// assert_eq!(price.to_minor_units(), 3000);
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// assert!(Price::new(Decimal::new(333, 3)).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest accepted unit price (`999_999.99`).
    pub const MAX: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, has fractions of a cent,
    /// or is above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::SubCent(amount));
        }
        if amount > Self::MAX {
            return Err(PriceError::TooLarge {
                max: Self::MAX,
                got: amount,
            });
        }
        Ok(Self(amount))
    }

    /// The amount in major currency units.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// The amount in minor currency units (cents). Exact, since a price never
    /// carries fractions of a cent.
    #[must_use]
    pub fn to_minor_units(self) -> i64 {
        // Bounded by `Price::MAX`, so the conversion cannot fail.
        minor_units(self.0).unwrap_or(i64::MAX)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self.0))
    }
}

/// Round a money amount to two decimal places, midpoints away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a major-unit amount into integer minor units.
///
/// Returns `None` if the rounded amount does not fit in an `i64`.
#[must_use]
pub fn minor_units(amount: Decimal) -> Option<i64> {
    let mut rounded = round_money(amount);
    rounded.rescale(2);
    i64::try_from(rounded.mantissa()).ok()
}

/// Format an amount with exactly two decimal places (`45` -> `"45.00"`).
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = round_money(amount);
    rounded.rescale(2);
    rounded.to_string()
}

/// ISO 4217 currency codes accepted for checkout.
///
/// The storefront charges in a single configured currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Lowercase code as payment providers expect it (`"usd"`).
    #[must_use]
    pub const fn as_provider_str(self) -> &'static str {
        match self {
            Self::USD => "usd",
            Self::EUR => "eur",
            Self::GBP => "gbp",
            Self::CAD => "cad",
            Self::AUD => "aud",
        }
    }
}

/// Error returned when parsing an unsupported currency code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency code: {0}")]
pub struct UnsupportedCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnsupportedCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usd" => Ok(Self::USD),
            "eur" => Ok(Self::EUR),
            "gbp" => Ok(Self::GBP),
            "cad" => Ok(Self::CAD),
            "aud" => Ok(Self::AUD),
            _ => Err(UnsupportedCurrency(s.to_string())),
        }
    }
}
