//! Product creation route handlers.
//!
//! The form posts `multipart/form-data`: scalar fields by name, up to
//! [`MAX_IMAGES`] files under `productImages`, and bundle rows as
//! `bundle_item_{name,size,scents}_{i}`.

use std::collections::BTreeMap;
use std::str::FromStr;

use askama::Template;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use siraj_core::product::draft::{BundleItemDraft, MAX_BUNDLE_ITEMS, MAX_IMAGES, ProductDraft};
use siraj_core::product::split_list;
use siraj_core::{ProductStatus, ProductType};
use thiserror::Error;
use tracing::instrument;

use crate::client::{AdminClientError, CreatedProduct, IMAGES_FIELD, ImageUpload};
use crate::error::AppError;
use crate::state::AppState;

const BUNDLE_NAME_PREFIX: &str = "bundle_item_name_";
const BUNDLE_SIZE_PREFIX: &str = "bundle_item_size_";
const BUNDLE_SCENTS_PREFIX: &str = "bundle_item_scents_";

/// A form field that could not be turned into a draft value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be a number (got {value:?})")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{0}")]
    InvalidChoice(String),
}

// =============================================================================
// Views
// =============================================================================

/// A `<select>` option.
#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: &'static str,
    pub selected: bool,
}

/// One bundle sub-item row.
#[derive(Debug, Clone)]
pub struct BundleRowView {
    pub index: usize,
    pub name: String,
    pub size: String,
    pub scents: String,
}

/// Form values, echoed back after a failed submission.
#[derive(Debug, Clone)]
pub struct DraftFormView {
    pub is_bundle: bool,
    pub product_types: Vec<OptionView>,
    pub statuses: Vec<OptionView>,
    pub category: String,
    pub price_egp: String,
    pub stock: u32,
    pub featured: bool,
    pub name_en: String,
    pub description_en: String,
    pub formatted_description: String,
    pub scents: String,
    pub size: String,
    pub burn_time: String,
    pub wick_type: String,
    pub coverage_space: String,
    pub bundle_name: String,
    pub bundle_description: String,
    pub bundle_rows: Vec<BundleRowView>,
}

impl From<&ProductDraft> for DraftFormView {
    fn from(draft: &ProductDraft) -> Self {
        let product_types = [ProductType::Single, ProductType::Bundle]
            .into_iter()
            .map(|t| OptionView {
                value: match t {
                    ProductType::Single => "Single",
                    ProductType::Bundle => "Bundle",
                },
                selected: t == draft.product_type,
            })
            .collect();
        let statuses = [
            ProductStatus::Active,
            ProductStatus::Draft,
            ProductStatus::Archived,
        ]
        .into_iter()
        .map(|s| OptionView {
            value: s.as_str(),
            selected: s == draft.status,
        })
        .collect();

        let bundle_rows = (0..MAX_BUNDLE_ITEMS.max(draft.bundle_items.len()))
            .map(|index| {
                let item = draft.bundle_items.get(index);
                BundleRowView {
                    index,
                    name: item.map(|i| i.name.clone()).unwrap_or_default(),
                    size: item.map(|i| i.size.clone()).unwrap_or_default(),
                    scents: item
                        .map(|i| i.allowed_scents.join(", "))
                        .unwrap_or_default(),
                }
            })
            .collect();

        Self {
            is_bundle: draft.product_type == ProductType::Bundle,
            product_types,
            statuses,
            category: draft.category.clone(),
            price_egp: if draft.price_egp.is_zero() {
                String::new()
            } else {
                draft.price_egp.to_string()
            },
            stock: draft.stock,
            featured: draft.featured,
            name_en: draft.name_en.clone(),
            description_en: draft.description_en.clone(),
            formatted_description: draft.formatted_description.clone(),
            scents: draft.scents.join(", "),
            size: draft.size.clone(),
            burn_time: draft.burn_time.clone(),
            wick_type: draft.wick_type.clone(),
            coverage_space: draft.coverage_space.clone(),
            bundle_name: draft.bundle_name.clone(),
            bundle_description: draft.bundle_description.clone(),
            bundle_rows,
        }
    }
}

/// New product page template.
#[derive(Template)]
#[template(path = "products/new.html")]
pub struct NewProductTemplate {
    pub form: DraftFormView,
    pub max_images: usize,
    pub created: Option<CreatedProduct>,
    pub error: Option<String>,
}

impl NewProductTemplate {
    fn new(draft: &ProductDraft) -> Self {
        Self {
            form: DraftFormView::from(draft),
            max_images: MAX_IMAGES,
            created: None,
            error: None,
        }
    }
}

fn render(status: StatusCode, template: &NewProductTemplate) -> Response {
    let html = Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }));
    (status, html).into_response()
}

// =============================================================================
// Form parsing
// =============================================================================

fn checkbox(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

/// Build a draft from the text fields of the form.
///
/// Unknown fields are ignored. Validation of the draft itself (names, images,
/// bundle size) happens later in [`ProductDraft::validate`].
///
/// # Errors
///
/// Returns a [`FieldError`] for a missing price, an unparseable number, or an
/// unknown product type or status.
pub fn draft_from_fields(fields: &[(String, String)]) -> Result<ProductDraft, FieldError> {
    let mut draft = ProductDraft::default();
    let mut price = None;
    let mut bundle_rows: BTreeMap<usize, BundleItemDraft> = BTreeMap::new();

    for (name, value) in fields {
        match name.as_str() {
            "productType" => {
                draft.product_type =
                    ProductType::from_str(value).map_err(FieldError::InvalidChoice)?;
            }
            "category" => draft.category = value.trim().to_string(),
            "price_egp" => {
                let value = value.trim();
                if !value.is_empty() {
                    price = Some(Decimal::from_str(value).map_err(|_| {
                        FieldError::InvalidNumber {
                            field: "price_egp",
                            value: value.to_string(),
                        }
                    })?);
                }
            }
            "stock" => {
                let value = value.trim();
                draft.stock = if value.is_empty() {
                    0
                } else {
                    value.parse().map_err(|_| FieldError::InvalidNumber {
                        field: "stock",
                        value: value.to_string(),
                    })?
                };
            }
            "status" => {
                draft.status = ProductStatus::from_str(value).map_err(FieldError::InvalidChoice)?;
            }
            "featured" => draft.featured = checkbox(value),
            "name_en" => draft.name_en.clone_from(value),
            "description_en" => draft.description_en.clone_from(value),
            "formattedDescription" => draft.formatted_description.clone_from(value),
            "scents" => draft.scents = split_list(value),
            "size" => draft.size.clone_from(value),
            "burnTime" => draft.burn_time.clone_from(value),
            "wickType" => draft.wick_type.clone_from(value),
            "coverageSpace" => draft.coverage_space.clone_from(value),
            "bundleName" => draft.bundle_name.clone_from(value),
            "bundleDescription" => draft.bundle_description.clone_from(value),
            other => {
                if let Some((item, row_field)) = bundle_row(&mut bundle_rows, other) {
                    match row_field {
                        RowField::Name => item.name.clone_from(value),
                        RowField::Size => item.size.clone_from(value),
                        RowField::Scents => item.allowed_scents = split_list(value),
                    }
                }
            }
        }
    }

    draft.price_egp = price.ok_or(FieldError::Missing("price_egp"))?;
    draft.bundle_items = bundle_rows.into_values().collect();
    Ok(draft)
}

enum RowField {
    Name,
    Size,
    Scents,
}

/// Resolve `bundle_item_*_{i}` to its row, creating the row on first use.
fn bundle_row<'a>(
    rows: &'a mut BTreeMap<usize, BundleItemDraft>,
    name: &str,
) -> Option<(&'a mut BundleItemDraft, RowField)> {
    let (row_field, index) = [
        (BUNDLE_NAME_PREFIX, RowField::Name),
        (BUNDLE_SIZE_PREFIX, RowField::Size),
        (BUNDLE_SCENTS_PREFIX, RowField::Scents),
    ]
    .into_iter()
    .find_map(|(prefix, row_field)| {
        name.strip_prefix(prefix)
            .and_then(|i| i.parse::<usize>().ok())
            .map(|i| (row_field, i))
    })?;
    Some((rows.entry(index).or_default(), row_field))
}

/// Everything read from the multipart body.
#[derive(Debug, Default)]
pub struct Upload {
    pub fields: Vec<(String, String)>,
    pub images: Vec<ImageUpload>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGES_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            // Browsers send an empty part when no file was picked
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            let mut image = ImageUpload::from_file_name(file_name, bytes.to_vec());
            if let Some(content_type) = content_type {
                image.content_type = content_type;
            }
            upload.images.push(image);
        } else {
            let value = field.text().await?;
            upload.fields.push((name, value));
        }
    }

    Ok(upload)
}

// =============================================================================
// Handlers
// =============================================================================

/// Redirect the root to the product form.
pub async fn index() -> Redirect {
    Redirect::to("/products/new")
}

/// Display the empty product form.
#[instrument]
pub async fn new() -> Response {
    render(StatusCode::OK, &NewProductTemplate::new(&ProductDraft::default()))
}

/// Create a product from the submitted form.
#[instrument(skip(state, multipart))]
pub async fn create(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => return e.into_response(),
    };

    let draft = match draft_from_fields(&upload.fields) {
        Ok(draft) => draft,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid product form");
            let mut template = NewProductTemplate::new(&ProductDraft::default());
            template.error = Some(e.to_string());
            return render(StatusCode::UNPROCESSABLE_ENTITY, &template);
        }
    };

    match state.client().create_product(&draft, upload.images).await {
        Ok(created) => {
            let mut template = NewProductTemplate::new(&ProductDraft::default());
            template.created = Some(created);
            render(StatusCode::OK, &template)
        }
        Err(e) => {
            let status = match &e {
                AdminClientError::Draft(_) | AdminClientError::Rejected(_) => {
                    tracing::warn!(error = %e, "Product not created");
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AdminClientError::Http(_)
                | AdminClientError::Status { .. }
                | AdminClientError::Parse(_) => {
                    let event_id = sentry::capture_error(&e);
                    tracing::error!(
                        error = %e,
                        sentry_event_id = %event_id,
                        "Product upload failed"
                    );
                    StatusCode::BAD_GATEWAY
                }
            };
            let mut template = NewProductTemplate::new(&draft);
            template.error = Some(e.to_string());
            render(status, &template)
        }
    }
}
