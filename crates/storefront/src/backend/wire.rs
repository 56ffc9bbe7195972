//! Backend JSON shapes and their conversion into domain types.
//!
//! The backend is loose about field names: a listing may put its array under
//! `results`, `bundles` or `data` (or return a bare array), a product may
//! carry `price_egp` or `price`, `imagePaths` or `images`, and option lists
//! arrive either as comma-separated strings or arrays. All of that is
//! resolved here, once, so nothing past this module sees a raw payload.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use siraj_core::checkout::{Discount, DiscountKind};
use siraj_core::product::{
    BundleDetails, BundleItem, Category, Product, ProductKind, SingleDetails, Variant, split_list,
};
use siraj_core::{Price, ProductId, ProductStatus};
use thiserror::Error;

use super::query::total_pages;

/// A product payload that cannot become a [`Product`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("product has no id")]
    MissingId,
    #[error("product {0} has no name")]
    MissingName(String),
    #[error("product {0} has a variant without a name")]
    MissingVariantName(String),
    #[error("product {0} has a negative price")]
    NegativePrice(String),
}

// =============================================================================
// List Envelope
// =============================================================================

/// Any of the list shapes the backend returns.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope {
    Bare(Vec<serde_json::Value>),
    Wrapped {
        #[serde(default)]
        results: Option<Vec<serde_json::Value>>,
        #[serde(default)]
        bundles: Option<Vec<serde_json::Value>>,
        #[serde(default)]
        data: Option<Vec<serde_json::Value>>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
    },
}

/// A list envelope reduced to its items and page numbers.
#[derive(Debug, PartialEq)]
pub struct NormalizedList {
    pub items: Vec<serde_json::Value>,
    pub total_pages: u32,
    pub current_page: u32,
}

impl ListEnvelope {
    /// Resolve the array key and page numbers.
    #[must_use]
    pub fn normalize(self, requested_page: u32, limit: u32) -> NormalizedList {
        let (items, total, page) = match self {
            Self::Bare(items) => (items, None, None),
            Self::Wrapped {
                results,
                bundles,
                data,
                total,
                page,
            } => (
                results.or(bundles).or(data).unwrap_or_default(),
                total,
                page,
            ),
        };

        NormalizedList {
            items,
            total_pages: total_pages(total, limit),
            current_page: page.filter(|p| *p > 0).unwrap_or(requested_page),
        }
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawProduct {
    #[serde(rename = "_id", alias = "id")]
    id: Option<String>,
    product_type: Option<String>,
    #[serde(rename = "name_en")]
    name_en: Option<String>,
    name: Option<String>,
    bundle_name: Option<String>,
    #[serde(rename = "description_en")]
    description_en: Option<String>,
    bundle_description: Option<String>,
    formatted_description: Option<String>,
    #[serde(rename = "price_egp")]
    price_egp: Option<Decimal>,
    price: Option<Decimal>,
    category: Option<String>,
    stock: Option<i64>,
    status: Option<String>,
    featured: Option<bool>,
    image_paths: Option<Vec<String>>,
    images: Option<Vec<String>>,
    #[serde(deserialize_with = "comma_list")]
    scents: Vec<String>,
    #[serde(alias = "sizes", deserialize_with = "comma_list")]
    size: Vec<String>,
    #[serde(alias = "weights", deserialize_with = "comma_list")]
    weight: Vec<String>,
    #[serde(alias = "types", deserialize_with = "comma_list")]
    r#type: Vec<String>,
    #[serde(alias = "shapes", deserialize_with = "comma_list")]
    shape: Vec<String>,
    burn_time: Option<String>,
    wick_type: Option<String>,
    coverage_space: Option<String>,
    bundle_items: Option<Vec<RawBundleItem>>,
    variants: Option<Vec<RawVariant>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawBundleItem {
    #[serde(alias = "name")]
    sub_product_name: Option<String>,
    size: Option<String>,
    #[serde(deserialize_with = "comma_list")]
    allowed_scents: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVariant {
    name: Option<String>,
    price: Option<Decimal>,
    stock: Option<i64>,
}

/// Accept `"a, b"`, `["a", "b"]` or `null`.
fn comma_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrList {
        Text(String),
        List(Vec<String>),
    }

    Ok(match Option::<TextOrList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(TextOrList::Text(text)) => split_list(&text),
        Some(TextOrList::List(list)) => list
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clamp_stock(stock: i64) -> u32 {
    u32::try_from(stock.max(0)).unwrap_or(u32::MAX)
}

impl TryFrom<RawProduct> for Product {
    type Error = ProductError;

    fn try_from(raw: RawProduct) -> Result<Self, Self::Error> {
        let id = text(raw.id).ok_or(ProductError::MissingId)?;

        let price = raw.price_egp.or(raw.price).unwrap_or_default();
        if price.is_sign_negative() && !price.is_zero() {
            return Err(ProductError::NegativePrice(id));
        }
        let price = Price::new(price);

        let variants = raw
            .variants
            .unwrap_or_default()
            .into_iter()
            .map(|variant| {
                let name =
                    text(variant.name).ok_or_else(|| ProductError::MissingVariantName(id.clone()))?;
                Ok(Variant {
                    name,
                    price: variant.price.map_or(price, Price::new),
                    stock: variant.stock.map(clamp_stock),
                })
            })
            .collect::<Result<Vec<_>, ProductError>>()?;

        let is_bundle = raw
            .product_type
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("bundle"));

        let kind = if is_bundle {
            ProductKind::Bundle(BundleDetails {
                name: text(raw.bundle_name)
                    .or_else(|| text(raw.name))
                    .ok_or_else(|| ProductError::MissingName(id.clone()))?,
                description: text(raw.bundle_description).or_else(|| text(raw.description_en)),
                items: raw
                    .bundle_items
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|item| {
                        Some(BundleItem {
                            name: text(item.sub_product_name)?,
                            size: text(item.size),
                            allowed_scents: item.allowed_scents,
                        })
                    })
                    .collect(),
            })
        } else {
            ProductKind::Single(SingleDetails {
                name: text(raw.name_en)
                    .or_else(|| text(raw.name))
                    .ok_or_else(|| ProductError::MissingName(id.clone()))?,
                description: text(raw.description_en),
                formatted_description: text(raw.formatted_description),
                scents: raw.scents,
                sizes: raw.size,
                weights: raw.weight,
                types: raw.r#type,
                shapes: raw.shape,
                burn_time: text(raw.burn_time),
                wick_type: text(raw.wick_type),
                coverage_space: text(raw.coverage_space),
            })
        };

        let images = raw
            .image_paths
            .filter(|paths| !paths.is_empty())
            .or(raw.images)
            .unwrap_or_default()
            .into_iter()
            .filter(|path| !path.trim().is_empty())
            .collect();

        Ok(Self {
            id: ProductId::new(id),
            category: text(raw.category),
            price,
            stock: raw.stock.map_or(0, clamp_stock),
            status: raw
                .status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(ProductStatus::Active),
            featured: raw.featured.unwrap_or(false),
            images,
            variants,
            kind,
        })
    }
}

/// Errors converting one product value.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("malformed product: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Product(#[from] ProductError),
}

/// Convert one backend product document.
///
/// # Errors
///
/// Returns an error if the document is not an object of the expected shape
/// or is missing required fields.
pub fn product_from_value(value: serde_json::Value) -> Result<Product, ConvertError> {
    let raw: RawProduct = serde_json::from_value(value)?;
    Ok(Product::try_from(raw)?)
}

/// Convert listing items, logging and skipping the ones that are invalid.
#[must_use]
pub fn products_from_values(values: Vec<serde_json::Value>) -> Vec<Product> {
    values
        .into_iter()
        .filter_map(|value| match product_from_value(value) {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::warn!(error = %e, "skipping invalid product in listing");
                None
            }
        })
        .collect()
}

// =============================================================================
// Categories, Discounts, Errors
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCategory {
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
}

/// Keep named categories, ordered by `sortOrder` then name.
#[must_use]
pub fn sorted_categories(raw: Vec<RawCategory>) -> Vec<Category> {
    let mut categories: Vec<Category> = raw
        .into_iter()
        .filter(|c| !c.name.trim().is_empty())
        .map(|c| Category {
            name: c.name.trim().to_string(),
            sort_order: c.sort_order,
        })
        .collect();
    categories.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.cmp(&b.name))
    });
    categories
}

/// Body of `POST /api/discounts/validate`.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRequest<'a> {
    pub code: &'a str,
    pub cart_total: Price,
}

#[derive(Debug, Deserialize)]
pub struct DiscountResponse {
    #[serde(default)]
    pub valid: bool,
    pub discount: Option<RawDiscount>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawDiscount {
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Decimal,
}

impl RawDiscount {
    /// Convert, keeping the code the customer typed when the backend omits it.
    #[must_use]
    pub fn into_discount(self, typed_code: &str) -> Option<Discount> {
        let kind = match self.kind.trim().to_ascii_lowercase().as_str() {
            "percentage" | "percent" => DiscountKind::Percentage(self.value),
            "fixed" | "amount" | "flat" => DiscountKind::Fixed(self.value),
            _ => return None,
        };
        Some(Discount {
            code: text(self.code).unwrap_or_else(|| typed_code.trim().to_string()),
            kind,
        })
    }
}

/// `{ "message": "..." }` error bodies.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Extract a human-readable message from an error response body.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    text(parsed.message).or_else(|| text(parsed.error))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope(value: serde_json::Value) -> ListEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_results_envelope() {
        let items: Vec<_> = (0..8).map(|i| json!({ "_id": i.to_string() })).collect();
        let list = envelope(json!({ "results": items, "total": 20 })).normalize(1, 12);
        assert_eq!(list.items.len(), 8);
        assert_eq!(list.total_pages, 2);
        assert_eq!(list.current_page, 1);
    }

    #[test]
    fn test_alternative_array_keys() {
        let list = envelope(json!({ "bundles": [{}], "total": 1, "page": 3 })).normalize(1, 12);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.current_page, 3);

        let list = envelope(json!({ "data": [{}, {}] })).normalize(2, 12);
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.total_pages, 1);
        assert_eq!(list.current_page, 2);
    }

    #[test]
    fn test_bare_array_envelope() {
        let list = envelope(json!([{}, {}, {}])).normalize(1, 12);
        assert_eq!(list.items.len(), 3);
        assert_eq!(list.total_pages, 1);
    }

    #[test]
    fn test_envelope_without_items() {
        let list = envelope(json!({ "total": 0 })).normalize(1, 12);
        assert!(list.items.is_empty());
        assert_eq!(list.total_pages, 1);
    }

    #[test]
    fn test_single_product_conversion() {
        let product = product_from_value(json!({
            "_id": "65f0",
            "productType": "Single",
            "name_en": "Vanilla Cookie Jar",
            "description_en": "Warm and sweet",
            "price_egp": 349.5,
            "category": "Candles",
            "stock": 7,
            "imagePaths": ["https://cdn.example.com/a.jpg"],
            "scents": "Vanilla, Cookie",
            "size": ["Large"],
            "burnTime": "45h",
            "featured": true
        }))
        .unwrap();

        assert_eq!(product.id.as_str(), "65f0");
        assert_eq!(product.name(), "Vanilla Cookie Jar");
        assert_eq!(product.price, Price::new(Decimal::new(3495, 1)));
        assert_eq!(product.stock, 7);
        assert!(product.featured);
        assert_eq!(product.primary_image(), "https://cdn.example.com/a.jpg");
        let ProductKind::Single(details) = &product.kind else {
            panic!("expected a single product");
        };
        assert_eq!(details.scents, vec!["Vanilla", "Cookie"]);
        assert_eq!(details.sizes, vec!["Large"]);
        assert_eq!(details.burn_time.as_deref(), Some("45h"));
    }

    #[test]
    fn test_bundle_conversion() {
        let product = product_from_value(json!({
            "_id": "b1",
            "productType": "Bundle",
            "bundleName": "Cozy Trio",
            "bundleDescription": "Three favourites",
            "price": "900",
            "images": ["/img/b1.jpg"],
            "bundleItems": [
                { "subProductName": "Big Jar Candle", "size": "Large", "allowedScents": "Rose, Oud" },
                { "subProductName": "", "allowedScents": [] },
                { "subProductName": "Wax Freshener", "allowedScents": ["Lavender"] }
            ]
        }))
        .unwrap();

        assert!(product.is_bundle());
        assert_eq!(product.name(), "Cozy Trio");
        assert_eq!(product.price, Price::from_pounds(900));
        let ProductKind::Bundle(details) = &product.kind else {
            panic!("expected a bundle");
        };
        assert_eq!(details.items.len(), 2);
        assert_eq!(details.items[0].allowed_scents, vec!["Rose", "Oud"]);
        assert_eq!(details.items[1].name, "Wax Freshener");
    }

    #[test]
    fn test_variant_without_name_is_rejected() {
        let err = product_from_value(json!({
            "_id": "p9",
            "name_en": "Jar",
            "price_egp": 100,
            "variants": [{ "price": 120 }]
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Product(ProductError::MissingVariantName(id)) if id == "p9"
        ));
    }

    #[test]
    fn test_variant_price_defaults_to_product_price() {
        let product = product_from_value(json!({
            "_id": "p9",
            "name_en": "Jar",
            "price_egp": 100,
            "variants": [{ "name": "200g", "stock": -3 }]
        }))
        .unwrap();
        assert_eq!(product.variants[0].price, Price::from_pounds(100));
        assert_eq!(product.variants[0].stock, Some(0));
    }

    #[test]
    fn test_missing_name_and_id() {
        assert!(matches!(
            product_from_value(json!({ "_id": "x", "price": 1 })),
            Err(ConvertError::Product(ProductError::MissingName(_)))
        ));
        assert!(matches!(
            product_from_value(json!({ "name_en": "No id" })),
            Err(ConvertError::Product(ProductError::MissingId))
        ));
    }

    #[test]
    fn test_invalid_items_are_skipped() {
        let products = products_from_values(vec![
            json!({ "_id": "ok", "name_en": "Good", "price": 10 }),
            json!({ "name_en": "No id" }),
            json!("not an object"),
        ]);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "ok");
    }

    #[test]
    fn test_categories_sorted() {
        let categories = sorted_categories(vec![
            RawCategory { name: "Gift Sets".to_string(), sort_order: 2 },
            RawCategory { name: " ".to_string(), sort_order: 0 },
            RawCategory { name: "Candles".to_string(), sort_order: 1 },
        ]);
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Candles", "Gift Sets"]);
    }

    #[test]
    fn test_raw_discount_conversion() {
        let raw = RawDiscount {
            code: None,
            kind: "Percentage".to_string(),
            value: Decimal::from(10),
        };
        let discount = raw.into_discount(" welcome10 ").unwrap();
        assert_eq!(discount.code, "welcome10");
        assert_eq!(discount.kind, DiscountKind::Percentage(Decimal::from(10)));

        let unknown = RawDiscount {
            code: None,
            kind: "bogo".to_string(),
            value: Decimal::ONE,
        };
        assert!(unknown.into_discount("X").is_none());
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"message":"Only 2 left in stock"}"#).as_deref(),
            Some("Only 2 left in stock")
        );
        assert_eq!(error_message("<html>").as_deref(), None);
    }
}
