//! Bundle listing route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use super::products::{ListingParams, PaginationView, ProductCardView, parse_page};
use crate::backend::ListQuery;
use crate::state::AppState;

/// Bundle listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "bundles/index.html")]
pub struct BundlesIndexTemplate {
    pub bundles: Vec<ProductCardView>,
    pub pagination: PaginationView,
}

/// Display bundle listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> impl IntoResponse {
    let query = ListQuery::first_page().page(parse_page(params.page.as_deref()));
    let page = state.backend().list_bundles(&query).await;

    BundlesIndexTemplate {
        bundles: page.items.iter().map(ProductCardView::from).collect(),
        pagination: PaginationView::new("/bundles", &page, &[]),
    }
}
