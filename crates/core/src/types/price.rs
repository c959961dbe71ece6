//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Menu and order prices can never be negative.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// A line or order total does not fit in a decimal.
    #[error("price total is too large")]
    Overflow,
}

/// A non-negative amount in the store's currency.
///
/// Serialized as a decimal string (`"12.50"`) to avoid float rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `cents < 0`.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a quantity (for line totals).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the product does not fit.
    pub fn checked_times(self, quantity: u32) -> Result<Self, PriceError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or(PriceError::Overflow)
    }

    /// Add two prices.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the sum does not fit.
    pub fn checked_add(self, other: Self) -> Result<Self, PriceError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(PriceError::Overflow)
    }

    /// Format with two decimal places and the currency symbol.
    #[must_use]
    pub fn display(&self, currency: CurrencyCode) -> String {
        format!("{}{:.2}", currency.symbol(), self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

/// ISO 4217 currency codes supported for store display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    INR,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::INR => "₹",
        }
    }
}
