//! Admin product drafts.
//!
//! A [`ProductDraft`] is what the admin form (or a YAML file fed to the CLI)
//! describes. [`ProductDraft::payload`] validates it and produces the JSON
//! document the backend expects under the `productData` multipart field. The
//! payload's field set switches entirely on the product type: a `Single`
//! payload never carries bundle keys and vice versa.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductStatus, ProductType};

/// Maximum number of images per product.
pub const MAX_IMAGES: usize = 5;

/// Maximum number of sub-items in a bundle.
pub const MAX_BUNDLE_ITEMS: usize = 10;

/// Errors found while validating a draft.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("please upload at least one image")]
    NoImages,
    #[error("at most {max} images are allowed (got {0})", max = MAX_IMAGES)]
    TooManyImages(usize),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("a bundle needs at least one item")]
    EmptyBundle,
    #[error("a bundle can have at most {max} items (got {0})", max = MAX_BUNDLE_ITEMS)]
    TooManyBundleItems(usize),
}

/// One sub-item row of a bundle draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleItemDraft {
    pub name: String,
    pub size: String,
    pub allowed_scents: Vec<String>,
}

/// A product as entered by an admin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    pub product_type: ProductType,
    pub category: String,
    pub price_egp: Decimal,
    pub stock: u32,
    pub status: ProductStatus,
    pub featured: bool,

    // Single product fields
    pub name_en: String,
    pub description_en: String,
    pub formatted_description: String,
    pub scents: Vec<String>,
    pub size: String,
    pub burn_time: String,
    pub wick_type: String,
    pub coverage_space: String,

    // Bundle fields
    pub bundle_name: String,
    pub bundle_description: String,
    pub bundle_items: Vec<BundleItemDraft>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommonPayload<'a> {
    product_type: ProductType,
    category: &'a str,
    #[serde(rename = "price_egp", with = "rust_decimal::serde::float")]
    price_egp: Decimal,
    stock: u32,
    status: ProductStatus,
    featured: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SinglePayload<'a> {
    #[serde(flatten)]
    common: CommonPayload<'a>,
    #[serde(rename = "name_en")]
    name_en: &'a str,
    #[serde(rename = "description_en")]
    description_en: &'a str,
    formatted_description: &'a str,
    scents: String,
    size: &'a str,
    burn_time: &'a str,
    wick_type: &'a str,
    coverage_space: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BundlePayload<'a> {
    #[serde(flatten)]
    common: CommonPayload<'a>,
    bundle_name: &'a str,
    bundle_description: &'a str,
    bundle_items: Vec<BundleItemPayload<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleItemPayload<'a> {
    sub_product_name: &'a str,
    size: &'a str,
    allowed_scents: String,
}

impl ProductDraft {
    /// Display name of the draft for its product type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self.product_type {
            ProductType::Single => &self.name_en,
            ProductType::Bundle => &self.bundle_name,
        }
    }

    /// Check the draft and the number of images attached to it.
    ///
    /// # Errors
    ///
    /// Returns the first [`DraftError`] found.
    pub fn validate(&self, image_count: usize) -> Result<(), DraftError> {
        if image_count == 0 {
            return Err(DraftError::NoImages);
        }
        if image_count > MAX_IMAGES {
            return Err(DraftError::TooManyImages(image_count));
        }
        if self.category.trim().is_empty() {
            return Err(DraftError::MissingField("category"));
        }
        if self.price_egp.is_sign_negative() && !self.price_egp.is_zero() {
            return Err(DraftError::NegativePrice);
        }

        match self.product_type {
            ProductType::Single => {
                if self.name_en.trim().is_empty() {
                    return Err(DraftError::MissingField("name_en"));
                }
            }
            ProductType::Bundle => {
                if self.bundle_name.trim().is_empty() {
                    return Err(DraftError::MissingField("bundle_name"));
                }
                let items = self.named_bundle_items().count();
                if items == 0 {
                    return Err(DraftError::EmptyBundle);
                }
                if items > MAX_BUNDLE_ITEMS {
                    return Err(DraftError::TooManyBundleItems(items));
                }
            }
        }
        Ok(())
    }

    /// Validate and serialize the backend `productData` document.
    ///
    /// Lists are joined into comma-separated strings, the format the backend
    /// stores them in. Bundle rows without a name are dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`DraftError`] if [`ProductDraft::validate`] fails.
    pub fn payload(&self, image_count: usize) -> Result<serde_json::Value, DraftError> {
        self.validate(image_count)?;

        let common = CommonPayload {
            product_type: self.product_type,
            category: self.category.trim(),
            price_egp: self.price_egp,
            stock: self.stock,
            status: self.status,
            featured: self.featured,
        };

        let value = match self.product_type {
            ProductType::Single => serde_json::to_value(SinglePayload {
                common,
                name_en: self.name_en.trim(),
                description_en: &self.description_en,
                formatted_description: &self.formatted_description,
                scents: self.scents.join(", "),
                size: &self.size,
                burn_time: &self.burn_time,
                wick_type: &self.wick_type,
                coverage_space: &self.coverage_space,
            }),
            ProductType::Bundle => serde_json::to_value(BundlePayload {
                common,
                bundle_name: self.bundle_name.trim(),
                bundle_description: &self.bundle_description,
                bundle_items: self
                    .named_bundle_items()
                    .map(|item| BundleItemPayload {
                        sub_product_name: item.name.trim(),
                        size: &item.size,
                        allowed_scents: item.allowed_scents.join(", "),
                    })
                    .collect(),
            }),
        };

        // Serializing plain structs of strings and numbers cannot fail.
        Ok(value.unwrap_or_default())
    }

    fn named_bundle_items(&self) -> impl Iterator<Item = &BundleItemDraft> {
        self.bundle_items
            .iter()
            .filter(|item| !item.name.trim().is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn single_draft() -> ProductDraft {
        ProductDraft {
            product_type: ProductType::Single,
            category: "Candles".to_owned(),
            price_egp: Decimal::new(3495, 1),
            stock: 12,
            name_en: "Vanilla Cookie Jar".to_owned(),
            scents: vec!["Vanilla".to_owned(), "Cookie".to_owned()],
            burn_time: "45h".to_owned(),
            ..ProductDraft::default()
        }
    }

    fn bundle_draft() -> ProductDraft {
        ProductDraft {
            product_type: ProductType::Bundle,
            category: "Gift Set".to_owned(),
            price_egp: Decimal::from(900),
            bundle_name: "Cozy Trio".to_owned(),
            bundle_items: vec![
                BundleItemDraft {
                    name: "Big Jar Candle".to_owned(),
                    size: "Large".to_owned(),
                    allowed_scents: vec!["Rose".to_owned(), "Oud".to_owned()],
                },
                BundleItemDraft::default(),
            ],
            // Single fields must not leak into a bundle payload
            name_en: "ignored".to_owned(),
            ..ProductDraft::default()
        }
    }

    #[test]
    fn test_single_payload_shape() {
        let payload = single_draft().payload(1).unwrap();
        assert_eq!(payload["productType"], "Single");
        assert_eq!(payload["name_en"], "Vanilla Cookie Jar");
        assert_eq!(payload["price_egp"], 349.5);
        assert_eq!(payload["scents"], "Vanilla, Cookie");
        assert_eq!(payload["burnTime"], "45h");
        assert_eq!(payload["status"], "Active");
        assert!(payload.get("bundleName").is_none());
        assert!(payload.get("bundleItems").is_none());
    }

    #[test]
    fn test_bundle_payload_shape() {
        let payload = bundle_draft().payload(2).unwrap();
        assert_eq!(payload["productType"], "Bundle");
        assert_eq!(payload["bundleName"], "Cozy Trio");
        let items = payload["bundleItems"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["subProductName"], "Big Jar Candle");
        assert_eq!(items[0]["allowedScents"], "Rose, Oud");
        assert!(payload.get("name_en").is_none());
        assert!(payload.get("scents").is_none());
    }

    #[test]
    fn test_image_count_validation() {
        assert_eq!(single_draft().validate(0), Err(DraftError::NoImages));
        assert_eq!(single_draft().validate(6), Err(DraftError::TooManyImages(6)));
        assert_eq!(
            DraftError::TooManyImages(6).to_string(),
            "at most 5 images are allowed (got 6)"
        );
        assert_eq!(
            DraftError::TooManyBundleItems(11).to_string(),
            "a bundle can have at most 10 items (got 11)"
        );
        assert!(single_draft().validate(5).is_ok());
    }

    #[test]
    fn test_required_names() {
        let mut draft = single_draft();
        draft.name_en = "  ".to_owned();
        assert_eq!(draft.validate(1), Err(DraftError::MissingField("name_en")));

        let mut draft = bundle_draft();
        draft.bundle_items.clear();
        assert_eq!(draft.validate(1), Err(DraftError::EmptyBundle));
    }

    #[test]
    fn test_bundle_item_limit() {
        let mut draft = bundle_draft();
        draft.bundle_items = (0..11)
            .map(|i| BundleItemDraft {
                name: format!("Item {i}"),
                ..BundleItemDraft::default()
            })
            .collect();
        assert_eq!(draft.validate(1), Err(DraftError::TooManyBundleItems(11)));
    }

    #[test]
    fn test_draft_from_yaml_style_json() {
        let draft: ProductDraft = serde_json::from_value(serde_json::json!({
            "product_type": "Bundle",
            "category": "Gift Set",
            "price_egp": "900",
            "bundle_name": "Trio",
            "bundle_items": [{ "name": "Candle", "allowed_scents": ["Rose"] }]
        }))
        .unwrap();
        assert_eq!(draft.name(), "Trio");
        assert_eq!(draft.bundle_items.len(), 1);
    }
}
