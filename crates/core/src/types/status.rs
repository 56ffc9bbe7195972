//! Status and kind enums shared by the catalog and checkout.

use serde::{Deserialize, Serialize};

/// Catalog visibility of a product.
///
/// Serialized with the backend's capitalized values (`"Active"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductStatus {
    #[default]
    Active,
    Draft,
    Archived,
}

impl ProductStatus {
    /// Backend wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Draft => "Draft",
            Self::Archived => "Archived",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" | "active" => Ok(Self::Active),
            "Draft" | "draft" => Ok(Self::Draft),
            "Archived" | "archived" => Ok(Self::Archived),
            other => Err(format!("invalid product status: {other}")),
        }
    }
}

/// Which field set a product carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductType {
    /// A single item (candle, freshener, diffuser).
    #[default]
    Single,
    /// A composite of named, individually customizable sub-items.
    Bundle,
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => f.write_str("Single"),
            Self::Bundle => f.write_str("Bundle"),
        }
    }
}

impl std::str::FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Single" | "single" => Ok(Self::Single),
            "Bundle" | "bundle" => Ok(Self::Bundle),
            other => Err(format!("invalid product type: {other}")),
        }
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "Cash on Delivery")]
    CashOnDelivery,
    #[serde(rename = "Card")]
    Card,
}

impl PaymentMethod {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on Delivery",
            Self::Card => "Card",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "cod" | "Cash on Delivery" => Ok(Self::CashOnDelivery),
            "card" | "Card" => Ok(Self::Card),
            other => Err(format!("invalid payment method: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_status_wire_format() {
        let json = serde_json::to_string(&ProductStatus::Active).unwrap_or_default();
        assert_eq!(json, "\"Active\"");
    }

    #[test]
    fn test_payment_method_wire_format() {
        let json = serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap_or_default();
        assert_eq!(json, "\"Cash on Delivery\"");
        assert_eq!("cod".parse(), Ok(PaymentMethod::CashOnDelivery));
    }

    #[test]
    fn test_product_type_parse() {
        assert_eq!("Bundle".parse(), Ok(ProductType::Bundle));
        assert!("Combo".parse::<ProductType>().is_err());
    }
}
