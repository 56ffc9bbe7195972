//! Catalog inspection commands.
//!
//! # Usage
//!
//! ```bash
//! siraj-cli catalog list
//! siraj-cli catalog list --bundles --page 2
//! siraj-cli catalog list --category "Gift Set"
//! ```

use siraj_storefront::backend::{BackendClient, BackendError, ListQuery, Listing};
use siraj_storefront::config::{BackendConfig, DEFAULT_BACKEND_URL};
use thiserror::Error;
use url::Url;

/// Errors that can occur during catalog commands.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// `BACKEND_API_URL` is not a valid URL.
    #[error("Invalid BACKEND_API_URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The backend request failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// List one page of products or bundles.
///
/// Returns the number of items on the page.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached or answers with an
/// unexpected document.
pub async fn list(
    bundles: bool,
    page: u32,
    category: Option<String>,
) -> Result<usize, CatalogError> {
    dotenvy::dotenv().ok();

    let raw_url =
        std::env::var("BACKEND_API_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
    let client = BackendClient::new(&BackendConfig::new(Url::parse(&raw_url)?))?;

    let listing = if bundles {
        Listing::Bundles
    } else {
        Listing::Products
    };
    let query = ListQuery::first_page().page(page).category(category);
    let result = client.fetch_page(listing, &query).await?;

    tracing::info!(
        "{} page {} of {}",
        listing.path(),
        result.current_page,
        result.total_pages
    );
    for product in &result.items {
        tracing::info!(
            "{}  {}  {}  stock {}  [{}]",
            product.id,
            product.name(),
            product.price.display(),
            product.stock,
            product.category.as_deref().unwrap_or("-")
        );
    }

    Ok(result.items.len())
}
