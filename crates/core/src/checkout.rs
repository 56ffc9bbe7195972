//! Checkout totals.
//!
//! Everything here is pure: the storefront fetches shipping rates and
//! validates coupons against the backend, then hands the results to
//! [`CheckoutTotals::compute`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Price;

/// Default subtotal from which shipping is free, in EGP.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: i64 = 2000;

/// Default shipping fee when no city rate applies, in EGP.
pub const DEFAULT_FLAT_SHIPPING_FEE: i64 = 50;

/// Shop-wide shipping rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
    pub free_threshold: Price,
    pub flat_fee: Price,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_threshold: Price::from_pounds(DEFAULT_FREE_SHIPPING_THRESHOLD),
            flat_fee: Price::from_pounds(DEFAULT_FLAT_SHIPPING_FEE),
        }
    }
}

/// Shipping fee for one city, as published by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    pub city: String,
    pub shipping_fee: Price,
}

/// The backend's city rate table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShippingRates(Vec<ShippingRate>);

impl ShippingRates {
    #[must_use]
    pub const fn new(rates: Vec<ShippingRate>) -> Self {
        Self(rates)
    }

    /// Fee for `city`, matched case-insensitively after trimming.
    #[must_use]
    pub fn fee_for(&self, city: &str) -> Option<Price> {
        let city = city.trim();
        if city.is_empty() {
            return None;
        }
        self.0
            .iter()
            .find(|rate| rate.city.trim().eq_ignore_ascii_case(city))
            .map(|rate| rate.shipping_fee)
    }

    /// City names, for the checkout city picker.
    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|rate| rate.city.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ShippingPolicy {
    /// Shipping fee for an order.
    ///
    /// Free from the threshold on, regardless of city. Otherwise the city's
    /// rate, falling back to the flat fee when there is no table or the city
    /// is not in it.
    #[must_use]
    pub fn shipping_fee(
        &self,
        subtotal: Price,
        city: &str,
        rates: Option<&ShippingRates>,
    ) -> Price {
        if subtotal >= self.free_threshold {
            return Price::ZERO;
        }
        rates
            .and_then(|rates| rates.fee_for(city))
            .unwrap_or(self.flat_fee)
    }
}

/// How a coupon reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DiscountKind {
    /// Percent of the subtotal.
    Percentage(Decimal),
    /// Fixed amount in EGP.
    Fixed(Decimal),
}

/// A coupon accepted by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub code: String,
    #[serde(flatten)]
    pub kind: DiscountKind,
}

impl Discount {
    /// Amount taken off `subtotal`, never more than the subtotal itself.
    #[must_use]
    pub fn amount_for(&self, subtotal: Price) -> Price {
        let raw = match self.kind {
            DiscountKind::Percentage(percent) => {
                Price::new(subtotal.amount() * percent / Decimal::ONE_HUNDRED).round()
            }
            DiscountKind::Fixed(amount) => Price::new(amount),
        };
        if raw.is_negative() {
            return Price::ZERO;
        }
        raw.min(subtotal)
    }

    /// Short label such as `"10% off"` or `"100.00 EGP off"`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.kind {
            DiscountKind::Percentage(percent) => format!("{}% off", percent.normalize()),
            DiscountKind::Fixed(amount) => format!("{} off", Price::new(amount)),
        }
    }
}

/// Order summary shown on the checkout page and sent with the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    pub subtotal: Price,
    pub shipping_fee: Price,
    pub discount: Price,
    pub total: Price,
}

impl CheckoutTotals {
    /// `total = subtotal + shipping - discount`, with the discount clamped to
    /// the subtotal.
    #[must_use]
    pub fn compute(
        subtotal: Price,
        policy: &ShippingPolicy,
        city: &str,
        rates: Option<&ShippingRates>,
        discount: Option<&Discount>,
    ) -> Self {
        let shipping_fee = policy.shipping_fee(subtotal, city, rates);
        let discount = discount.map_or(Price::ZERO, |d| d.amount_for(subtotal));
        Self {
            subtotal,
            shipping_fee,
            discount,
            total: subtotal + shipping_fee - discount,
        }
    }
}
