//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (categories + bestsellers)
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /products               - Product listing (page, category, search, sort)
//! GET  /products/{id}          - Product detail + related products
//! GET  /bundles                - Bundle listing
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns add_result, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Checkout form + order summary
//! POST /checkout               - Place the order
//! GET  /checkout/summary       - Order summary for a city (fragment)
//! POST /checkout/discount      - Apply or remove a coupon (returns summary fragment)
//! ```

pub mod bundles;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/summary", get(checkout::summary))
        .route("/discount", post(checkout::apply_discount))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog routes
        .nest("/products", product_routes())
        .route("/bundles", get(bundles::index))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout routes
        .nest("/checkout", checkout_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use axum::body::to_bytes;
    use axum::response::Response;

    use crate::config::StorefrontConfig;
    use crate::state::AppState;

    /// The full app, pointed at a backend port nothing listens on.
    pub fn test_app() -> axum::Router {
        let config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
            "BACKEND_API_URL" => Some("http://127.0.0.1:9".to_string()),
            "BACKEND_TIMEOUT_SECS" => Some("2".to_string()),
            _ => None,
        })
        .unwrap();
        crate::app(AppState::new(config).unwrap())
    }

    pub async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}
