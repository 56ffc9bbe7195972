//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /                       - Redirects to the product form
//!
//! # Products (written to the backend)
//! GET  /products/new           - Product creation form
//! POST /products               - Create a product (multipart with images)
//! ```

pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/products", post(products::create))
        .route("/products/new", get(products::new))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use axum::body::to_bytes;
    use axum::response::Response;

    use crate::config::AdminConfig;
    use crate::state::AppState;

    /// The full app, pointed at a backend port nothing listens on.
    pub fn test_app() -> axum::Router {
        let config = AdminConfig::from_lookup(|key| match key {
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
