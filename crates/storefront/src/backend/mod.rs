//! Client for the Siraj backend REST API.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`; the backend is the source of truth for the
//!   catalog, shipping rates, discounts and orders
//! - Wire payloads are converted into `siraj_core` types in [`wire`]
//! - Catalog reads (listings, products, categories, shipping rates) are
//!   cached in memory via `moka`; discounts and orders never are
//!
//! # Failure semantics
//!
//! Listing reads never fail: any error is logged and an empty page is
//! returned so the page can show a "none found" message. Detail reads and
//! writes return [`BackendError`] and the caller shows the message inline.

mod cache;
pub mod query;
pub mod wire;

use std::sync::Arc;

use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use siraj_core::checkout::{Discount, ShippingRates};
use siraj_core::order::{OrderConfirmation, OrderRequest};
use siraj_core::product::{Category, Product};
use siraj_core::{Price, ProductId};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::BackendConfig;

use cache::{CacheKey, CacheValue};
pub use query::{ListQuery, Listing, Page};
pub use wire::{ConvertError, ProductError};

/// Home page bestseller count.
pub const FEATURED_LIMIT: u32 = 6;

/// Related products shown under a product.
pub const RELATED_LIMIT: u32 = 4;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success status without a usable message.
    #[error("Backend returned HTTP {status}")]
    Status { status: u16 },

    /// The backend refused the request with a message for the customer.
    #[error("{0}")]
    Rejected(String),

    /// A product payload failed boundary validation.
    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ConvertError),
}

impl BackendError {
    /// Message suitable for showing to a customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) => message.clone(),
            Self::NotFound(_) => "We couldn't find what you were looking for.".to_string(),
            Self::InvalidProduct(_) => "This product is currently unavailable.".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::Status { .. } => {
                "Our shop is having trouble right now. Please try again shortly.".to_string()
            }
        }
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the backend REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    page_size: u32,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("siraj-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
                page_size: config.page_size,
                cache,
            }),
        })
    }

    /// Configured default page size.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }

    /// `{base}/api/{segments...}`, each segment percent-encoded so ids
    /// cannot add path levels or a query string.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    /// GET a JSON document.
    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&'static str, String)],
    ) -> Result<T, BackendError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(segments))
            .query(query)
            .send()
            .await?;
        Self::read_json(&segments.join("/"), response).await
    }

    /// POST a JSON body and read a JSON response.
    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, BackendError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(segments))
            .json(body)
            .send()
            .await?;
        Self::read_json(&segments.join("/"), response).await
    }

    async fn read_json<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                path,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(wire::error_message(&body).map_or(
                BackendError::Status {
                    status: status.as_u16(),
                },
                BackendError::Rejected,
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Fetch one page of a listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the envelope is malformed.
    /// Invalid items inside a valid envelope are skipped, not errors.
    pub async fn fetch_page(
        &self,
        listing: Listing,
        query: &ListQuery,
    ) -> Result<Page<Product>, BackendError> {
        let key = CacheKey::Page(listing, query.clone());
        if let Some(CacheValue::Page(page)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for listing");
            return Ok(page);
        }

        let limit = query.effective_limit(self.inner.page_size);
        let envelope: wire::ListEnvelope = self
            .get_json(&[listing.path()], &query.params(self.inner.page_size))
            .await?;
        let list = envelope.normalize(query.requested_page(), limit);

        let page = Page {
            items: wire::products_from_values(list.items),
            total_pages: list.total_pages,
            current_page: list.current_page,
        };

        self.inner
            .cache
            .insert(key, CacheValue::Page(page.clone()))
            .await;

        Ok(page)
    }

    /// Fetch a listing page, degrading to an empty page on any error.
    #[instrument(skip(self))]
    pub async fn list(&self, listing: Listing, query: &ListQuery) -> Page<Product> {
        match self.fetch_page(listing, query).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(error = %e, listing = listing.path(), "Failed to fetch listing");
                Page::empty()
            }
        }
    }

    /// Product listing (`GET /api/products`).
    pub async fn list_products(&self, query: &ListQuery) -> Page<Product> {
        self.list(Listing::Products, query).await
    }

    /// Bundle listing (`GET /api/bundles`).
    pub async fn list_bundles(&self, query: &ListQuery) -> Page<Product> {
        self.list(Listing::Bundles, query).await
    }

    /// Featured products for the home page.
    pub async fn featured_products(&self) -> Vec<Product> {
        let query = ListQuery {
            featured: Some(true),
            ..ListQuery::first_page().limit(FEATURED_LIMIT)
        };
        self.list_products(&query).await.items
    }

    /// Active products from the same category, excluding `exclude_id`.
    pub async fn related_products(
        &self,
        category: Option<&str>,
        exclude_id: &ProductId,
    ) -> Vec<Product> {
        let query = ListQuery {
            exclude_id: Some(exclude_id.to_string()),
            status: Some(siraj_core::ProductStatus::Active),
            ..ListQuery::first_page()
                .limit(RELATED_LIMIT)
                .category(Some(category.unwrap_or("general").to_string()))
        };
        self.list_products(&query)
            .await
            .items
            .into_iter()
            .filter(|product| &product.id != exclude_id)
            .collect()
    }

    // =========================================================================
    // Products & Categories
    // =========================================================================

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist, the request fails, or
    /// the payload fails validation.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let key = CacheKey::Product(id.to_string());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let raw_id = id.as_str().trim();
        if matches!(raw_id, "" | "." | "..") {
            return Err(BackendError::NotFound(format!("products/{raw_id}")));
        }

        let value: serde_json::Value = self.get_json(&["products", raw_id], &[]).await?;
        let product = wire::product_from_value(value)?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Catalog categories ordered by `sortOrder`; empty on failure.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Vec<Category> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            return categories;
        }

        match self.get_json::<Vec<wire::RawCategory>>(&["categories"], &[]).await {
            Ok(raw) => {
                let categories = wire::sorted_categories(raw);
                self.inner
                    .cache
                    .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
                    .await;
                categories
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch categories");
                Vec::new()
            }
        }
    }

    /// City shipping rates; `None` on failure so checkout uses the flat rule.
    #[instrument(skip(self))]
    pub async fn get_shipping_rates(&self) -> Option<ShippingRates> {
        if let Some(CacheValue::ShippingRates(rates)) =
            self.inner.cache.get(&CacheKey::ShippingRates).await
        {
            return Some(rates);
        }

        match self.get_json::<ShippingRates>(&["shipping-rates"], &[]).await {
            Ok(rates) => {
                self.inner
                    .cache
                    .insert(CacheKey::ShippingRates, CacheValue::ShippingRates(rates.clone()))
                    .await;
                Some(rates)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch shipping rates");
                None
            }
        }
    }

    // =========================================================================
    // Checkout (not cached)
    // =========================================================================

    /// Ask the backend whether `code` is a valid coupon for `cart_total`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] with the backend's message when the
    /// code is not valid, or another error if the request fails.
    #[instrument(skip(self, code))]
    pub async fn validate_discount(
        &self,
        code: &str,
        cart_total: Price,
    ) -> Result<Discount, BackendError> {
        let request = wire::DiscountRequest {
            code: code.trim(),
            cart_total,
        };
        let response: wire::DiscountResponse =
            match self.post_json(&["discounts", "validate"], &request).await {
                Ok(response) => response,
                Err(BackendError::NotFound(_)) => {
                    return Err(BackendError::Rejected("Invalid discount code".to_string()));
                }
                Err(e) => return Err(e),
            };

        let wire::DiscountResponse {
            valid,
            discount,
            message,
        } = response;
        let rejected = move || {
            BackendError::Rejected(message.unwrap_or_else(|| "Invalid discount code".to_string()))
        };

        if !valid {
            return Err(rejected());
        }
        discount
            .and_then(|raw| raw.into_discount(code))
            .ok_or_else(rejected)
    }

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] with the backend's message (for
    /// example a stock conflict), or another error if the request fails.
    #[instrument(skip(self, order), fields(items = order.items.len(), total = %order.total_amount))]
    pub async fn place_order(
        &self,
        order: &OrderRequest,
    ) -> Result<OrderConfirmation, BackendError> {
        self.post_json(&["orders"], order).await
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
