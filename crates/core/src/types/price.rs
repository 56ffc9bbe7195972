//! Type-safe price representation using decimal arithmetic.
//!
//! The shop sells in Egyptian pounds only, so a price is a bare decimal amount
//! tagged with the EGP currency code at display time.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul, Sub};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price in Egyptian pounds.
///
/// Arithmetic is exact (`rust_decimal`); rounding only happens in
/// [`Price::round`] and when formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(serialize_with = "rust_decimal::serde::float::serialize")] Decimal);

impl Price {
    /// ISO 4217 code of the shop currency.
    pub const CURRENCY_CODE: &'static str = "EGP";

    /// Zero pounds.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from whole pounds.
    #[must_use]
    pub fn from_pounds(pounds: i64) -> Self {
        Self(Decimal::from(pounds))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Round to piastres (2 decimal places, half away from zero).
    #[must_use]
    pub fn round(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// The smaller of two prices.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self <= other { self } else { other }
    }

    /// Format for display (e.g., "250.00 EGP").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:.2} {}", self.round().0, Self::CURRENCY_CODE)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::from_pounds(250).display(), "250.00 EGP");
        assert_eq!(Price::new(Decimal::new(19_995, 3)).display(), "20.00 EGP");
    }

    #[test]
    fn test_line_arithmetic() {
        let total: Price = [Price::from_pounds(100) * 2, Price::from_pounds(50) * 1]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_pounds(250));
    }

    #[test]
    fn test_negative() {
        assert!((Price::from_pounds(10) - Price::from_pounds(20)).is_negative());
        assert!(!Price::ZERO.is_negative());
    }

    #[test]
    fn test_deserializes_from_json_number() {
        let price: Price = serde_json::from_str("349.5").unwrap_or_default();
        assert_eq!(price, Price::new(Decimal::new(3495, 1)));
    }

    #[test]
    fn test_serializes_as_json_number() {
        let json = serde_json::to_value(Price::new(Decimal::new(3495, 1))).unwrap_or_default();
        assert_eq!(json, serde_json::json!(349.5));
    }
}
