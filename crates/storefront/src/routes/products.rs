//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use siraj_core::ProductId;
use siraj_core::product::{Product, ProductKind};
use tracing::instrument;
use url::form_urlencoded;

use crate::backend::{BackendError, ListQuery, Page};
use crate::state::AppState;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub url: String,
    pub name: String,
    pub price: String,
    pub image: String,
    pub category: Option<String>,
    pub is_bundle: bool,
    pub out_of_stock: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            url: format!("/products/{}", product.id),
            name: product.name().to_string(),
            price: product.price.display(),
            image: product.primary_image().to_string(),
            category: product.category.clone(),
            is_bundle: product.is_bundle(),
            out_of_stock: product.is_out_of_stock(),
        }
    }
}

/// Labelled attribute chip.
#[derive(Clone)]
pub struct AttributeView {
    pub label: &'static str,
    pub value: String,
}

/// Variant option display data.
#[derive(Clone)]
pub struct VariantView {
    pub name: String,
    pub price: String,
    pub available: bool,
}

/// One bundle component and the scents the customer may pick for it.
#[derive(Clone)]
pub struct BundleItemView {
    /// Form field carrying this item's scent choice.
    pub field: String,
    pub name: String,
    pub size: Option<String>,
    pub scents: Vec<String>,
}

/// Product detail display data for templates.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub category: Option<String>,
    pub primary_image: String,
    pub images: Vec<String>,
    pub attributes: Vec<AttributeView>,
    pub variants: Vec<VariantView>,
    /// Scent choices, only when there is more than one to choose from.
    pub scent_options: Vec<String>,
    /// Size choices, only when there is more than one to choose from.
    pub size_options: Vec<String>,
    pub bundle_items: Vec<BundleItemView>,
    pub out_of_stock: bool,
    pub max_quantity: u32,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        let (scent_options, size_options, bundle_items) = match &product.kind {
            ProductKind::Single(single) => (
                choices(&single.scents),
                choices(&single.sizes),
                Vec::new(),
            ),
            ProductKind::Bundle(bundle) => (
                Vec::new(),
                Vec::new(),
                bundle
                    .items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| BundleItemView {
                        field: format!("{}{index}", super::cart::BUNDLE_SCENT_FIELD),
                        name: item.name.clone(),
                        size: item.size.clone(),
                        scents: item.allowed_scents.clone(),
                    })
                    .collect(),
            ),
        };

        let description = match &product.kind {
            ProductKind::Single(single) => single
                .formatted_description
                .clone()
                .or_else(|| single.description.clone()),
            ProductKind::Bundle(bundle) => bundle.description.clone(),
        };

        Self {
            id: product.id.to_string(),
            name: product.name().to_string(),
            description,
            price: product.price.display(),
            category: product.category.clone(),
            primary_image: product.primary_image().to_string(),
            images: product.images.clone(),
            attributes: product
                .attributes()
                .into_iter()
                .map(|(label, value)| AttributeView { label, value })
                .collect(),
            variants: product
                .variants
                .iter()
                .map(|variant| VariantView {
                    name: variant.name.clone(),
                    price: variant.price.display(),
                    available: variant.stock != Some(0),
                })
                .collect(),
            scent_options,
            size_options,
            bundle_items,
            out_of_stock: product.is_out_of_stock(),
            max_quantity: product.max_quantity(),
        }
    }
}

/// A sole offered value is implied, so only real choices are rendered.
fn choices(offered: &[String]) -> Vec<String> {
    if offered.len() > 1 {
        offered.to_vec()
    } else {
        Vec::new()
    }
}

/// Previous/next links for a listing page.
#[derive(Clone)]
pub struct PaginationView {
    pub current_page: u32,
    pub total_pages: u32,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

impl PaginationView {
    /// Build links for `page`, keeping the non-empty `filters` in each URL.
    #[must_use]
    pub fn new<T>(path: &str, page: &Page<T>, filters: &[(&str, Option<&str>)]) -> Self {
        let link = |target: u32| {
            let mut query = form_urlencoded::Serializer::new(String::new());
            for (key, value) in filters {
                if let Some(value) = value.filter(|v| !v.is_empty()) {
                    query.append_pair(key, value);
                }
            }
            query.append_pair("page", &target.to_string());
            format!("{path}?{}", query.finish())
        };

        Self {
            current_page: page.current_page,
            total_pages: page.total_pages,
            previous_url: page
                .has_previous()
                .then(|| link(page.current_page.saturating_sub(1))),
            next_url: page.has_next().then(|| link(page.current_page + 1)),
        }
    }
}

/// Read a `page` query value, falling back to the first page.
#[must_use]
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1)
}

/// Listing query parameters.
///
/// `page` is kept as text so a malformed value falls back to page 1 instead
/// of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub page: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub pagination: PaginationView,
    pub categories: Vec<String>,
    pub category: String,
    pub search: String,
    pub sort: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: Option<ProductDetailView>,
    pub related_products: Vec<ProductCardView>,
    pub error: Option<String>,
}

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> impl IntoResponse {
    let query = ListQuery::first_page()
        .page(parse_page(params.page.as_deref()))
        .category(params.category.clone())
        .search(params.search.clone())
        .sort(params.sort.clone());

    let (page, categories) = tokio::join!(
        state.backend().list_products(&query),
        state.backend().get_categories()
    );

    let pagination = PaginationView::new(
        "/products",
        &page,
        &[
            ("category", query.category.as_deref()),
            ("search", query.search.as_deref()),
            ("sort", query.sort.as_deref()),
        ],
    );

    ProductsIndexTemplate {
        products: page.items.iter().map(ProductCardView::from).collect(),
        pagination,
        categories: categories.into_iter().map(|c| c.name).collect(),
        category: query.category.clone().unwrap_or_default(),
        search: query.search.clone().unwrap_or_default(),
        sort: query.sort.clone().unwrap_or_default(),
    }
}

/// Display product detail page.
///
/// Lookup failures render the page with an inline message; only a missing
/// product changes the status code.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = ProductId::new(id);

    match state.backend().get_product(&id).await {
        Ok(product) => {
            let related = state
                .backend()
                .related_products(product.category.as_deref(), &product.id)
                .await;

            ProductShowTemplate {
                product: Some(ProductDetailView::from(&product)),
                related_products: related.iter().map(ProductCardView::from).collect(),
                error: None,
            }
            .into_response()
        }
        Err(BackendError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            ProductShowTemplate {
                product: None,
                related_products: Vec::new(),
                error: Some("We couldn't find that product.".to_string()),
            },
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, product_id = %id, "Failed to load product");
            ProductShowTemplate {
                product: None,
                related_products: Vec::new(),
                error: Some(e.user_message()),
            }
            .into_response()
        }
    }
}
