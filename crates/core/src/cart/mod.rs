//! Shopping cart.
//!
//! [`Cart`] is a plain reducer over an ordered list of [`CartItem`]s: every
//! operation is synchronous and infallible. [`CartManager`] wraps a cart with
//! an injected [`CartStore`] and writes the whole cart back after each
//! mutation.
//!
//! # Line identity
//!
//! Two additions of the same product only merge into one line when they
//! carry the same variant and the same customization multiset. The line
//! identity is a [`CartLineId`] computed by [`compute_unique_id`]:
//!
//! ```text
//! <productId>[::v=<variantName>][::c=<JSON array of sorted selections>]
//! ```

mod manager;

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::product::{Product, SelectedOptions};
use crate::types::{Price, ProductId};

pub use manager::{CartEvent, CartManager, CartStore, MemoryCartStore, MemoryStoreError};

/// Identity of one cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLineId(String);

impl CartLineId {
    /// Wrap a line ID received from a form or URL.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the line identity for a product, variant and customization.
///
/// Deterministic and independent of the order of `customization`. An empty
/// customization list and a blank variant name are the same as none.
#[must_use]
pub fn compute_unique_id(
    product_id: &ProductId,
    customization: &[String],
    variant_name: Option<&str>,
) -> CartLineId {
    let variant = variant_name.map(str::trim).filter(|v| !v.is_empty());
    let mut sorted: Vec<&str> = customization.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    // JSON tuple, so no part can imitate a separator.
    CartLineId(serde_json::json!([product_id.as_str(), variant, sorted]).to_string())
}

/// Parse a quantity typed by the user.
///
/// Anything that is not an integer becomes `0`, which cart updates treat as
/// removal.
#[must_use]
pub fn parse_quantity(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(0)
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    line_id: CartLineId,
    pub id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customization_selections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    pub image_url: String,
}

impl CartItem {
    /// Create a line with quantity 1 and no variant or customization.
    #[must_use]
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        unit_price: Price,
        image_url: impl Into<String>,
    ) -> Self {
        let line_id = compute_unique_id(&id, &[], None);
        Self {
            line_id,
            id,
            name: name.into(),
            unit_price,
            quantity: 1,
            customization_selections: Vec::new(),
            variant_name: None,
            image_url: image_url.into(),
        }
    }

    /// Build a line from a product and a validated selection.
    #[must_use]
    pub fn from_selection(product: &Product, options: SelectedOptions) -> Self {
        Self::new(
            product.id.clone(),
            product.name(),
            options.unit_price,
            product.primary_image(),
        )
        .with_variant(options.variant_name)
        .with_customization(options.customization)
    }

    /// Set the variant name and recompute the line identity.
    #[must_use]
    pub fn with_variant(mut self, variant_name: Option<String>) -> Self {
        self.variant_name = variant_name.filter(|v| !v.trim().is_empty());
        self.refresh_line_id();
        self
    }

    /// Set the customization selections and recompute the line identity.
    #[must_use]
    pub fn with_customization(mut self, selections: Vec<String>) -> Self {
        self.customization_selections = selections;
        self.refresh_line_id();
        self
    }

    #[must_use]
    pub const fn line_id(&self) -> &CartLineId {
        &self.line_id
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price * self.quantity
    }

    fn refresh_line_id(&mut self) {
        self.line_id = compute_unique_id(
            &self.id,
            &self.customization_selections,
            self.variant_name.as_deref(),
        );
    }
}

/// Result of [`Cart::update_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Updated,
    Removed,
    NotFound,
}

/// The cart: lines in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, line_id: &CartLineId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.line_id == line_id)
    }

    /// Add `quantity` of `item`, merging into an existing line with the same
    /// identity. A quantity of 0 counts as 1. Returns the affected line.
    pub fn add(&mut self, mut item: CartItem, quantity: u32) -> &CartItem {
        let quantity = quantity.max(1);
        item.refresh_line_id();

        let index = if let Some(index) = self.position(&item.line_id) {
            let existing = &mut self.items[index];
            existing.quantity = existing.quantity.saturating_add(quantity);
            index
        } else {
            item.quantity = quantity;
            self.items.push(item);
            self.items.len() - 1
        };
        &self.items[index]
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, line_id: &CartLineId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.line_id != line_id);
        self.items.len() != before
    }

    /// Set a line's quantity; `quantity <= 0` removes the line.
    pub fn update_quantity(&mut self, line_id: &CartLineId, quantity: i64) -> QuantityChange {
        let Some(index) = self.position(line_id) else {
            return QuantityChange::NotFound;
        };

        match u32::try_from(quantity) {
            Ok(quantity) if quantity > 0 => {
                self.items[index].quantity = quantity;
                QuantityChange::Updated
            }
            Ok(_) => {
                self.items.remove(index);
                QuantityChange::Removed
            }
            Err(_) if quantity > 0 => {
                self.items[index].quantity = u32::MAX;
                QuantityChange::Updated
            }
            Err(_) => {
                self.items.remove(index);
                QuantityChange::Removed
            }
        }
    }

    /// Sum of `unit_price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities, for the header badge.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |count, item| count.saturating_add(item.quantity))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Repair a cart read back from storage: recompute line identities,
    /// merge lines that now collide and drop zero-quantity lines.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut cart = Self::new();
        for item in self.items {
            if item.quantity == 0 {
                continue;
            }
            let quantity = item.quantity;
            cart.add(item, quantity);
        }
        cart
    }

    fn position(&self, line_id: &CartLineId) -> Option<usize> {
        self.items.iter().position(|item| &item.line_id == line_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn item(id: &str, price: i64) -> CartItem {
        CartItem::new(
            ProductId::new(id),
            format!("Item {id}"),
            Price::from_pounds(price),
            "/img.jpg",
        )
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn test_unique_id_ignores_customization_order() {
        let id = ProductId::new("p1");
        let a = compute_unique_id(&id, &strings(&["Rose", "Oud", "Vanilla"]), Some("200g"));
        let b = compute_unique_id(&id, &strings(&["Vanilla", "Rose", "Oud"]), Some("200g"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_unique_id_distinguishes_variant_and_customization() {
        let id = ProductId::new("p1");
        let plain = compute_unique_id(&id, &[], None);
        let variant = compute_unique_id(&id, &[], Some("400g"));
        let custom = compute_unique_id(&id, &strings(&["Rose"]), None);
        let both = compute_unique_id(&id, &strings(&["Rose"]), Some("400g"));

        assert_eq!(plain.as_str(), r#"["p1",null,[]]"#);
        assert_ne!(plain, variant);
        assert_ne!(plain, custom);
        assert_ne!(variant, both);
        assert_ne!(custom, both);
    }

    #[test]
    fn test_unique_id_blank_variant_is_none() {
        let id = ProductId::new("p1");
        assert_eq!(
            compute_unique_id(&id, &[], Some("  ")),
            compute_unique_id(&id, &[], None)
        );
    }

    #[test]
    fn test_unique_id_parts_cannot_run_together() {
        let spliced_variant = compute_unique_id(
            &ProductId::new("p1"),
            &[],
            Some(r#"x::c=["a"]"#),
        );
        let separate = compute_unique_id(&ProductId::new("p1"), &strings(&["a"]), Some("x"));
        assert_ne!(spliced_variant, separate);

        let spliced_id = compute_unique_id(&ProductId::new("p1::v=200g"), &[], None);
        let with_variant = compute_unique_id(&ProductId::new("p1"), &[], Some("200g"));
        assert_ne!(spliced_id, with_variant);
    }

    #[test]
    fn test_unique_id_keeps_duplicate_selections() {
        let id = ProductId::new("b1");
        let twice = compute_unique_id(&id, &strings(&["Rose", "Rose"]), None);
        let once = compute_unique_id(&id, &strings(&["Rose"]), None);
        assert_ne!(twice, once);
    }

    #[test]
    fn test_add_merges_same_line() {
        let mut split = Cart::new();
        split.add(item("p1", 100), 2);
        split.add(item("p1", 100), 3);

        let mut once = Cart::new();
        once.add(item("p1", 100), 5);

        assert_eq!(split, once);
        assert_eq!(split.items().len(), 1);
        assert_eq!(split.items()[0].quantity, 5);
    }

    #[test]
    fn test_add_keeps_customized_lines_apart() {
        let mut cart = Cart::new();
        cart.add(item("p1", 100).with_customization(strings(&["Rose"])), 1);
        cart.add(item("p1", 100).with_customization(strings(&["Oud"])), 1);
        cart.add(item("p1", 100).with_variant(Some("400g".to_owned())), 1);
        assert_eq!(cart.items().len(), 3);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut cart = Cart::new();
        cart.add(item("b", 1), 1);
        cart.add(item("a", 1), 1);
        cart.add(item("b", 1), 1);
        let ids: Vec<&str> = cart.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_add_zero_counts_as_one() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(item("p1", 100), 0).quantity, 1);
    }

    #[test]
    fn test_update_to_zero_or_negative_removes() {
        for quantity in [0, -1] {
            let mut cart = Cart::new();
            let line = cart.add(item("p1", 100), 2).line_id().clone();
            assert_eq!(
                cart.update_quantity(&line, quantity),
                QuantityChange::Removed
            );
            assert!(cart.get(&line).is_none());
        }
    }

    #[test]
    fn test_update_sets_quantity() {
        let mut cart = Cart::new();
        let line = cart.add(item("p1", 100), 2).line_id().clone();
        assert_eq!(cart.update_quantity(&line, 7), QuantityChange::Updated);
        assert_eq!(cart.get(&line).unwrap().quantity, 7);
        assert_eq!(
            cart.update_quantity(&CartLineId::new("missing"), 3),
            QuantityChange::NotFound
        );
    }

    #[test]
    fn test_non_numeric_quantity_means_removal() {
        assert_eq!(parse_quantity("abc"), 0);
        assert_eq!(parse_quantity(" 4 "), 4);
        assert_eq!(parse_quantity("-2"), -2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        let line = cart.add(item("p1", 100), 1).line_id().clone();
        assert!(cart.remove(&line));
        assert!(!cart.remove(&line));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total() {
        let mut cart = Cart::new();
        cart.add(item("p1", 100), 2);
        cart.add(item("p2", 50), 1);
        assert_eq!(cart.total(), Price::from_pounds(250));
        assert_eq!(cart.item_count(), 3);
        assert_eq!(Cart::new().total(), Price::ZERO);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut cart = Cart::new();
        cart.add(
            item("p1", 100)
                .with_variant(Some("200g".to_owned()))
                .with_customization(strings(&["Rose", "Oud"])),
            2,
        );
        cart.add(item("p2", 50), 1);

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
        assert_eq!(restored.items()[0].line_id(), cart.items()[0].line_id());
    }

    #[test]
    fn test_serialized_shape() {
        let mut cart = Cart::new();
        cart.add(item("p1", 100), 2);
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], "p1");
        assert_eq!(json[0]["quantity"], 2);
        assert_eq!(json[0]["lineId"], "p1");
        assert!(json[0].get("variantName").is_none());
    }

    #[test]
    fn test_normalized_merges_and_drops() {
        let json = serde_json::json!([
            { "lineId": "stale", "id": "p1", "name": "A", "unitPrice": "10",
              "quantity": 1, "imageUrl": "" },
            { "lineId": "p1", "id": "p1", "name": "A", "unitPrice": "10",
              "quantity": 2, "imageUrl": "" },
            { "lineId": "p2", "id": "p2", "name": "B", "unitPrice": "5",
              "quantity": 0, "imageUrl": "" }
        ]);
        let cart: Cart = serde_json::from_value(json).unwrap();
        let cart = cart.normalized();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(
            cart.items()[0].line_id(),
            &compute_unique_id(&ProductId::new("p1"), &[], None)
        );
    }
}
