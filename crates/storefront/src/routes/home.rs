//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use siraj_core::product::Product;
use tracing::instrument;
use url::form_urlencoded;

use super::products::ProductCardView;
use crate::backend::ListQuery;
use crate::state::AppState;

/// How many products are scanned when the backend has no category list.
const CATEGORY_SCAN_LIMIT: u32 = 100;

/// Category card display data for templates.
#[derive(Clone)]
pub struct CategoryView {
    pub name: String,
    pub url: String,
}

impl CategoryView {
    fn new(name: String) -> Self {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("category", &name)
            .finish();
        Self {
            url: format!("/products?{query}"),
            name,
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Category cards linking to the filtered listing.
    pub categories: Vec<CategoryView>,
    /// Featured products shown as bestsellers.
    pub featured_products: Vec<ProductCardView>,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let (categories, featured) = tokio::join!(
        categories(&state),
        state.backend().featured_products()
    );

    HomeTemplate {
        categories: categories.into_iter().map(CategoryView::new).collect(),
        featured_products: featured.iter().map(ProductCardView::from).collect(),
    }
}

/// Category names from the backend, or derived from the catalog when the
/// category list is empty.
async fn categories(state: &AppState) -> Vec<String> {
    let categories = state.backend().get_categories().await;
    if !categories.is_empty() {
        return categories.into_iter().map(|c| c.name).collect();
    }

    let scan = ListQuery::first_page().limit(CATEGORY_SCAN_LIMIT);
    let page = state.backend().list_products(&scan).await;
    categories_in(&page.items)
}

/// Distinct categories in first-seen order.
fn categories_in(products: &[Product]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for category in products.iter().filter_map(|p| p.category.as_deref()) {
        if !category.is_empty() && !names.iter().any(|n| n == category) {
            names.push(category.to_string());
        }
    }
    names
}
