//! Catalog products.
//!
//! The backend stores two mutually exclusive product shapes in one
//! collection. Here they are one explicit tagged type: every [`Product`]
//! carries the common commercial fields plus a [`ProductKind`] that is either
//! [`SingleDetails`] or [`BundleDetails`]. Wire payloads are converted into
//! this type at the API boundary (see the storefront's backend conversions),
//! so page code never falls back across alternative field names.

pub mod draft;

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, ProductStatus, ProductType};

pub use draft::{BundleItemDraft, DraftError, ProductDraft};

/// Image shown when a product has no uploaded images.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.svg";

/// Quantity cap on the detail page when stock is not tracked.
pub const DEFAULT_MAX_QUANTITY: u32 = 10;

/// A sellable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category: Option<String>,
    pub price: Price,
    pub stock: u32,
    pub status: ProductStatus,
    pub featured: bool,
    /// Image URLs, first one is the primary image.
    pub images: Vec<String>,
    /// Priced options such as weight tiers. Empty when the product has none.
    pub variants: Vec<Variant>,
    pub kind: ProductKind,
}

/// Type-specific product fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "productType")]
pub enum ProductKind {
    Single(SingleDetails),
    Bundle(BundleDetails),
}

/// Fields of a single (non-bundle) product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleDetails {
    pub name: String,
    pub description: Option<String>,
    pub formatted_description: Option<String>,
    pub scents: Vec<String>,
    pub sizes: Vec<String>,
    pub weights: Vec<String>,
    pub types: Vec<String>,
    pub shapes: Vec<String>,
    pub burn_time: Option<String>,
    pub wick_type: Option<String>,
    pub coverage_space: Option<String>,
}

/// Fields of a bundle product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDetails {
    pub name: String,
    pub description: Option<String>,
    pub items: Vec<BundleItem>,
}

/// One customizable sub-item of a bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleItem {
    pub name: String,
    pub size: Option<String>,
    /// Scents the customer may pick for this item. Empty means any.
    pub allowed_scents: Vec<String>,
}

/// A named price/stock-bearing option of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub price: Price,
    /// `None` when the backend does not track stock per variant.
    pub stock: Option<u32>,
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub sort_order: i32,
}

/// What the customer picked on the product page before adding to cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub variant: Option<String>,
    pub scent: Option<String>,
    pub size: Option<String>,
    /// One scent per bundle item, in bundle item order.
    pub bundle_scents: Vec<String>,
}

/// A validated selection, ready to become a cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedOptions {
    pub unit_price: Price,
    pub variant_name: Option<String>,
    pub customization: Vec<String>,
}

/// Reasons an add-to-cart selection is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("product is out of stock")]
    OutOfStock,
    #[error("please choose an option")]
    MissingVariant,
    #[error("unknown option: {0}")]
    UnknownVariant(String),
    #[error("option {0} is out of stock")]
    VariantOutOfStock(String),
    #[error("please choose a scent")]
    MissingScent,
    #[error("please choose a size")]
    MissingSize,
    #[error("{value} is not available for {field}")]
    NotOffered { field: String, value: String },
    #[error("please choose a scent for {0}")]
    MissingBundleScent(String),
}

impl Product {
    /// Display name for either product kind.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.kind {
            ProductKind::Single(single) => &single.name,
            ProductKind::Bundle(bundle) => &bundle.name,
        }
    }

    /// Short description for either product kind.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match &self.kind {
            ProductKind::Single(single) => single.description.as_deref(),
            ProductKind::Bundle(bundle) => bundle.description.as_deref(),
        }
    }

    #[must_use]
    pub const fn product_type(&self) -> ProductType {
        match self.kind {
            ProductKind::Single(_) => ProductType::Single,
            ProductKind::Bundle(_) => ProductType::Bundle,
        }
    }

    #[must_use]
    pub const fn is_bundle(&self) -> bool {
        matches!(self.kind, ProductKind::Bundle(_))
    }

    /// First image, or the placeholder.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or(PLACEHOLDER_IMAGE, String::as_str)
    }

    /// A product is out of stock when neither it nor any variant has stock.
    #[must_use]
    pub fn is_out_of_stock(&self) -> bool {
        if self.variants.is_empty() {
            return self.stock == 0;
        }
        self.variants
            .iter()
            .all(|v| v.stock.map_or(self.stock == 0, |s| s == 0))
    }

    /// Upper bound for the quantity picker.
    #[must_use]
    pub const fn max_quantity(&self) -> u32 {
        if self.stock == 0 {
            DEFAULT_MAX_QUANTITY
        } else {
            self.stock
        }
    }

    /// Find a variant by name.
    #[must_use]
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Labelled attributes shown as chips on the detail page.
    #[must_use]
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let ProductKind::Single(single) = &self.kind else {
            return Vec::new();
        };

        let mut attributes = Vec::new();
        if !single.scents.is_empty() {
            attributes.push(("Scent", single.scents.join(", ")));
        }
        if !single.sizes.is_empty() {
            attributes.push(("Size", single.sizes.join(", ")));
        }
        let optional = [
            ("Burn Time", &single.burn_time),
            ("Wick", &single.wick_type),
            ("Coverage", &single.coverage_space),
        ];
        for (label, value) in optional {
            if let Some(value) = value {
                attributes.push((label, value.clone()));
            }
        }
        attributes
    }

    /// Validate a customer's selection against this product.
    ///
    /// Rules:
    /// - a product with variants needs an in-stock variant, whose price wins;
    /// - a bundle needs one scent per item, from the item's allowed scents;
    /// - a single product offering more than one scent (or size) needs one;
    ///   a sole offered value is implied and does not split cart lines.
    ///
    /// # Errors
    ///
    /// Returns the first [`SelectionError`] found.
    pub fn select(&self, selection: &Selection) -> Result<SelectedOptions, SelectionError> {
        if self.is_out_of_stock() {
            return Err(SelectionError::OutOfStock);
        }

        let (unit_price, variant_name) = self.select_variant(selection.variant.as_deref())?;

        let customization = match &self.kind {
            ProductKind::Single(single) => select_single_options(single, selection)?,
            ProductKind::Bundle(bundle) => select_bundle_scents(bundle, &selection.bundle_scents)?,
        };

        Ok(SelectedOptions {
            unit_price,
            variant_name,
            customization,
        })
    }

    fn select_variant(
        &self,
        requested: Option<&str>,
    ) -> Result<(Price, Option<String>), SelectionError> {
        if self.variants.is_empty() {
            return Ok((self.price, None));
        }

        let name = non_blank(requested).ok_or(SelectionError::MissingVariant)?;
        let variant = self
            .variant(name)
            .ok_or_else(|| SelectionError::UnknownVariant(name.to_owned()))?;
        if variant.stock == Some(0) {
            return Err(SelectionError::VariantOutOfStock(variant.name.clone()));
        }
        Ok((variant.price, Some(variant.name.clone())))
    }
}

fn select_single_options(
    single: &SingleDetails,
    selection: &Selection,
) -> Result<Vec<String>, SelectionError> {
    let mut customization = Vec::new();

    let scent = pick_offered(
        "scent",
        &single.scents,
        selection.scent.as_deref(),
        SelectionError::MissingScent,
    )?;
    customization.extend(scent);

    let size = pick_offered(
        "size",
        &single.sizes,
        selection.size.as_deref(),
        SelectionError::MissingSize,
    )?;
    customization.extend(size);

    Ok(customization)
}

/// Resolve one free-text option. `Ok(None)` when the choice does not matter.
fn pick_offered(
    field: &str,
    offered: &[String],
    chosen: Option<&str>,
    missing: SelectionError,
) -> Result<Option<String>, SelectionError> {
    if offered.len() <= 1 {
        return Ok(None);
    }
    let chosen = non_blank(chosen).ok_or(missing)?;
    if offered.iter().any(|o| o == chosen) {
        Ok(Some(chosen.to_owned()))
    } else {
        Err(SelectionError::NotOffered {
            field: field.to_owned(),
            value: chosen.to_owned(),
        })
    }
}

fn select_bundle_scents(
    bundle: &BundleDetails,
    chosen: &[String],
) -> Result<Vec<String>, SelectionError> {
    bundle
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let scent = non_blank(chosen.get(index).map(String::as_str))
                .ok_or_else(|| SelectionError::MissingBundleScent(item.name.clone()))?;
            if !item.allowed_scents.is_empty() && !item.allowed_scents.iter().any(|s| s == scent) {
                return Err(SelectionError::NotOffered {
                    field: item.name.clone(),
                    value: scent.to_owned(),
                });
            }
            Ok(scent.to_owned())
        })
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Split a comma-separated free-text list, trimming and dropping blanks.
///
/// The backend stores option lists (`"Vanilla, Rose"`) as one string.
#[must_use]
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn single(id: &str, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            category: Some("Candles".to_owned()),
            price: Price::from_pounds(price),
            stock: 5,
            status: ProductStatus::Active,
            featured: false,
            images: vec![format!("https://cdn.example.com/{id}.jpg")],
            variants: Vec::new(),
            kind: ProductKind::Single(SingleDetails {
                name: format!("Candle {id}"),
                ..SingleDetails::default()
            }),
        }
    }

    pub fn bundle(id: &str, price: i64, items: &[(&str, Vec<&str>)]) -> Product {
        Product {
            id: ProductId::new(id),
            category: Some("Gift Set".to_owned()),
            price: Price::from_pounds(price),
            stock: 3,
            status: ProductStatus::Active,
            featured: true,
            images: Vec::new(),
            variants: Vec::new(),
            kind: ProductKind::Bundle(BundleDetails {
                name: format!("Bundle {id}"),
                description: None,
                items: items
                    .iter()
                    .map(|(name, scents)| BundleItem {
                        name: (*name).to_owned(),
                        size: None,
                        allowed_scents: scents.iter().map(|s| (*s).to_owned()).collect(),
                    })
                    .collect(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fixtures::{bundle, single};
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" Vanilla Cookie, Rose ,,  "),
            vec!["Vanilla Cookie".to_owned(), "Rose".to_owned()]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_plain_single_needs_no_selection() {
        let product = single("p1", 120);
        let selected = product.select(&Selection::default()).unwrap();
        assert_eq!(selected.unit_price, Price::from_pounds(120));
        assert!(selected.customization.is_empty());
        assert!(selected.variant_name.is_none());
    }

    #[test]
    fn test_single_with_many_scents_requires_one() {
        let mut product = single("p1", 120);
        if let ProductKind::Single(details) = &mut product.kind {
            details.scents = vec!["Rose".to_owned(), "Oud".to_owned()];
        }

        assert_eq!(
            product.select(&Selection::default()),
            Err(SelectionError::MissingScent)
        );

        let selection = Selection {
            scent: Some("Oud".to_owned()),
            ..Selection::default()
        };
        assert_eq!(
            product.select(&selection).unwrap().customization,
            vec!["Oud".to_owned()]
        );

        let selection = Selection {
            scent: Some("Pine".to_owned()),
            ..Selection::default()
        };
        assert!(matches!(
            product.select(&selection),
            Err(SelectionError::NotOffered { .. })
        ));
    }

    #[test]
    fn test_variant_price_wins() {
        let mut product = single("p1", 120);
        product.variants = vec![
            Variant {
                name: "200g".to_owned(),
                price: Price::from_pounds(150),
                stock: Some(4),
            },
            Variant {
                name: "400g".to_owned(),
                price: Price::from_pounds(260),
                stock: Some(0),
            },
        ];

        assert_eq!(
            product.select(&Selection::default()),
            Err(SelectionError::MissingVariant)
        );

        let pick = |name: &str| Selection {
            variant: Some(name.to_owned()),
            ..Selection::default()
        };
        let selected = product.select(&pick("200g")).unwrap();
        assert_eq!(selected.unit_price, Price::from_pounds(150));
        assert_eq!(selected.variant_name.as_deref(), Some("200g"));

        assert_eq!(
            product.select(&pick("400g")),
            Err(SelectionError::VariantOutOfStock("400g".to_owned()))
        );
        assert_eq!(
            product.select(&pick("1kg")),
            Err(SelectionError::UnknownVariant("1kg".to_owned()))
        );
    }

    #[test]
    fn test_bundle_requires_scent_per_item() {
        let product = bundle(
            "b1",
            900,
            &[
                ("Big Jar Candle", vec!["Vanilla", "Rose"]),
                ("Wax Freshener", vec![]),
            ],
        );

        let partial = Selection {
            bundle_scents: vec!["Vanilla".to_owned()],
            ..Selection::default()
        };
        assert_eq!(
            product.select(&partial),
            Err(SelectionError::MissingBundleScent("Wax Freshener".to_owned()))
        );

        let full = Selection {
            bundle_scents: vec!["Rose".to_owned(), "Anything".to_owned()],
            ..Selection::default()
        };
        assert_eq!(
            product.select(&full).unwrap().customization,
            vec!["Rose".to_owned(), "Anything".to_owned()]
        );

        let wrong = Selection {
            bundle_scents: vec!["Oud".to_owned(), "Anything".to_owned()],
            ..Selection::default()
        };
        assert!(matches!(
            product.select(&wrong),
            Err(SelectionError::NotOffered { .. })
        ));
    }

    #[test]
    fn test_out_of_stock() {
        let mut product = single("p1", 120);
        product.stock = 0;
        assert!(product.is_out_of_stock());
        assert_eq!(
            product.select(&Selection::default()),
            Err(SelectionError::OutOfStock)
        );
    }

    #[test]
    fn test_primary_image_placeholder() {
        let product = bundle("b1", 900, &[]);
        assert_eq!(product.primary_image(), PLACEHOLDER_IMAGE);
        assert_eq!(product.name(), "Bundle b1");
    }

    #[test]
    fn test_attributes_only_for_singles() {
        let mut product = single("p1", 120);
        if let ProductKind::Single(details) = &mut product.kind {
            details.scents = vec!["Rose".to_owned()];
            details.burn_time = Some("40h".to_owned());
        }
        assert_eq!(
            product.attributes(),
            vec![("Scent", "Rose".to_owned()), ("Burn Time", "40h".to_owned())]
        );
        assert!(bundle("b1", 900, &[]).attributes().is_empty());
    }
}
