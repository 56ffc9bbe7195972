//! Integration tests for Siraj.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (fake backend on an ephemeral port)
//! cargo test -p siraj-integration-tests
//!
//! # Smoke tests against a running storefront
//! STOREFRONT_URL=http://localhost:3000 cargo test -p siraj-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `catalog_client` - Backend client against the fake backend
//! - `storefront_flow` - Browse, cart and checkout through the storefront
//! - `admin_upload` - Product creation through the admin app
//! - `smoke` - Live storefront checks (ignored by default)

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use siraj_admin::config::AdminConfig;
use siraj_storefront::config::StorefrontConfig;
use tokio::net::TcpListener;

/// A product upload as the backend received it.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub product_data: Value,
    pub image_names: Vec<String>,
}

#[derive(Default)]
struct Recorded {
    hits: Mutex<HashMap<String, usize>>,
    orders: Mutex<Vec<Value>>,
    discount_checks: Mutex<Vec<Value>>,
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl Recorded {
    fn hit(&self, path: &str) {
        *self
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_string())
            .or_default() += 1;
    }
}

/// In-process stand-in for the Siraj backend REST API.
///
/// Serves a fixed catalog of three single products and one bundle, the
/// Cairo and Alexandria shipping rates, and the `WELCOME10` coupon. Orders
/// and uploads are recorded for assertions.
pub struct FakeBackend {
    pub url: String,
    recorded: Arc<Recorded>,
}

impl FakeBackend {
    /// Start the fake backend on an ephemeral port.
    pub async fn start() -> Self {
        let recorded = Arc::new(Recorded::default());
        let router = Router::new()
            .route("/api/products", get(list_products).post(create_product))
            .route("/api/products/{id}", get(get_product))
            .route("/api/bundles", get(list_bundles))
            .route("/api/categories", get(categories))
            .route("/api/shipping-rates", get(shipping_rates))
            .route("/api/discounts/validate", post(validate_discount))
            .route("/api/orders", post(create_order))
            .with_state(Arc::clone(&recorded));

        let addr = serve(router).await;
        Self {
            url: format!("http://{addr}"),
            recorded,
        }
    }

    /// How many times `path` (e.g. `/api/products`) was requested.
    pub fn hits(&self, path: &str) -> usize {
        self.recorded
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .copied()
            .unwrap_or_default()
    }

    /// Discount validation bodies received so far.
    pub fn discount_checks(&self) -> Vec<Value> {
        self.recorded
            .discount_checks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Order bodies received so far.
    pub fn orders(&self) -> Vec<Value> {
        self.recorded
            .orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Product uploads received so far.
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.recorded
            .uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Storefront configuration pointing at this backend.
    pub fn storefront_config(&self) -> StorefrontConfig {
        StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
            "BACKEND_API_URL" => Some(self.url.clone()),
            "BACKEND_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
        .expect("valid storefront test configuration")
    }

    /// Admin configuration pointing at this backend.
    pub fn admin_config(&self) -> AdminConfig {
        AdminConfig::from_lookup(|key| match key {
            "BACKEND_API_URL" => Some(self.url.clone()),
            "BACKEND_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
        .expect("valid admin test configuration")
    }
}

/// Serve `router` on an ephemeral localhost port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server error");
    });
    addr
}

/// Start the storefront app against `backend` and return its base URL.
pub async fn start_storefront(backend: &FakeBackend) -> String {
    let state = siraj_storefront::state::AppState::new(backend.storefront_config())
        .expect("storefront state");
    let addr = serve(siraj_storefront::app(state)).await;
    format!("http://{addr}")
}

/// Start the admin app against `backend` and return its base URL.
pub async fn start_admin(backend: &FakeBackend) -> String {
    let state = siraj_admin::state::AppState::new(backend.admin_config()).expect("admin state");
    let addr = serve(siraj_admin::app(state)).await;
    format!("http://{addr}")
}

/// HTTP client with a cookie store, so the session cart survives requests.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

// =============================================================================
// Fixture catalog
// =============================================================================

/// The catalog the fake backend serves, in backend wire format.
pub fn catalog() -> Vec<Value> {
    vec![
        json!({
            "_id": "p-amber",
            "productType": "Single",
            "name_en": "Amber Jar",
            "description_en": "Warm amber in a glass jar.",
            "price_egp": 250,
            "category": "Candles",
            "stock": 5,
            "status": "Active",
            "featured": true,
            "imagePaths": ["/uploads/amber.jpg"],
            "scents": "Amber, Oud",
            "burnTime": "40h"
        }),
        json!({
            "_id": "p-rose",
            "productType": "Single",
            "name_en": "Rose Jar",
            "price_egp": 300,
            "category": "Candles",
            "stock": 0,
            "status": "Active",
            "featured": false,
            "imagePaths": ["/uploads/rose.jpg"],
            "scents": "Rose"
        }),
        json!({
            "_id": "p-diffuser",
            "productType": "Single",
            "name_en": "Reed Diffuser",
            "price_egp": 400,
            "category": "Diffusers",
            "stock": 3,
            "status": "Active",
            "featured": true,
            "images": ["/uploads/diffuser.jpg"],
            "variants": [
                { "name": "100ml", "price": 400, "stock": 3 },
                { "name": "200ml", "price": 650, "stock": 1 }
            ]
        }),
        json!({
            "_id": "b-trio",
            "productType": "Bundle",
            "bundleName": "Cozy Trio",
            "bundleDescription": "Three candles for the living room.",
            "price_egp": 900,
            "category": "Gift Set",
            "stock": 4,
            "status": "Active",
            "imagePaths": ["/uploads/trio.jpg"],
            "bundleItems": [
                { "subProductName": "Big Jar", "size": "Large", "allowedScents": "Rose, Oud" },
                { "subProductName": "Mini Jar", "allowedScents": ["Vanilla", "Amber"] }
            ]
        }),
    ]
}

fn param<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    query.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn page_of(items: Vec<Value>, query: &HashMap<String, String>) -> (Vec<Value>, usize) {
    let total = items.len();
    let page: usize = param(query, "page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: usize = param(query, "limit").and_then(|l| l.parse().ok()).unwrap_or(12);
    let items = items
        .into_iter()
        .skip(page.saturating_sub(1) * limit)
        .take(limit)
        .collect();
    (items, total)
}

async fn list_products(
    State(recorded): State<Arc<Recorded>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    recorded.hit("/api/products");

    let search = param(&query, "search").map(str::to_lowercase);
    let items: Vec<Value> = catalog()
        .into_iter()
        .filter(|p| p["productType"] == "Single")
        .filter(|p| param(&query, "category").is_none_or(|c| p["category"] == c))
        .filter(|p| param(&query, "featured") != Some("true") || p["featured"] == true)
        .filter(|p| param(&query, "exclude_id").is_none_or(|id| p["_id"] != id))
        .filter(|p| {
            search.as_deref().is_none_or(|s| {
                p["name_en"]
                    .as_str()
                    .is_some_and(|name| name.to_lowercase().contains(s))
            })
        })
        .collect();

    let (items, total) = page_of(items, &query);
    Json(json!({ "results": items, "total": total }))
}

async fn list_bundles(
    State(recorded): State<Arc<Recorded>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    recorded.hit("/api/bundles");
    let bundles = catalog()
        .into_iter()
        .filter(|p| p["productType"] == "Bundle")
        .collect();
    let (items, total) = page_of(bundles, &query);
    Json(json!({ "bundles": items, "total": total }))
}

async fn get_product(State(recorded): State<Arc<Recorded>>, Path(id): Path<String>) -> Response {
    recorded.hit("/api/products/{id}");
    catalog().into_iter().find(|p| p["_id"] == id.as_str()).map_or_else(
        || {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Product not found" })),
            )
                .into_response()
        },
        |product| Json(product).into_response(),
    )
}

async fn categories(State(recorded): State<Arc<Recorded>>) -> Json<Value> {
    recorded.hit("/api/categories");
    Json(json!([
        { "name": "Gift Set", "sortOrder": 2 },
        { "name": "Candles", "sortOrder": 1 },
        { "name": "Diffusers", "sortOrder": 3 }
    ]))
}

async fn shipping_rates(State(recorded): State<Arc<Recorded>>) -> Json<Value> {
    recorded.hit("/api/shipping-rates");
    Json(json!([
        { "city": "Cairo", "shippingFee": 50 },
        { "city": "Alexandria", "shippingFee": 70 }
    ]))
}

async fn validate_discount(
    State(recorded): State<Arc<Recorded>>,
    Json(body): Json<Value>,
) -> Response {
    recorded.hit("/api/discounts/validate");
    recorded
        .discount_checks
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(body.clone());

    let cart_total = body["cartTotal"].as_f64().unwrap_or_default();
    if body["code"] == "WELCOME10" {
        Json(json!({
            "valid": true,
            "discount": { "code": "WELCOME10", "type": "percentage", "value": 10 }
        }))
        .into_response()
    } else if body["code"] == "BIG100" && cart_total >= 1000.0 {
        Json(json!({
            "valid": true,
            "discount": { "code": "BIG100", "type": "fixed", "value": 100 }
        }))
        .into_response()
    } else if body["code"] == "BIG100" {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "valid": false, "message": "BIG100 needs an order of 1000 EGP" })),
        )
            .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "valid": false, "message": "Invalid discount code" })),
        )
            .into_response()
    }
}

async fn create_order(State(recorded): State<Arc<Recorded>>, Json(body): Json<Value>) -> Response {
    recorded.hit("/api/orders");
    let catalog = catalog();

    for item in body["items"].as_array().into_iter().flatten() {
        let stock = catalog
            .iter()
            .find(|p| p["_id"] == item["productId"])
            .and_then(|p| p["stock"].as_u64())
            .unwrap_or_default();
        if item["quantity"].as_u64().unwrap_or_default() > stock {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "message": format!("Only {stock} left in stock for {}", item["name"].as_str().unwrap_or_default())
                })),
            )
                .into_response();
        }
    }

    let mut orders = recorded
        .orders
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    orders.push(body);
    let order_id = format!("ORD-{}", orders.len());
    (StatusCode::CREATED, Json(json!({ "orderId": order_id }))).into_response()
}

async fn create_product(State(recorded): State<Arc<Recorded>>, mut multipart: Multipart) -> Response {
    recorded.hit("/api/products#create");

    let mut product_data = None;
    let mut image_names = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name() {
            Some("productImages") => {
                image_names.push(field.file_name().unwrap_or_default().to_string());
            }
            Some("productData") => {
                let text = field.text().await.unwrap_or_default();
                product_data = serde_json::from_str::<Value>(&text).ok();
            }
            _ => {}
        }
    }

    let Some(product_data) = product_data else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "productData is required" })),
        )
            .into_response();
    };
    if image_names.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "At least one image is required" })),
        )
            .into_response();
    }

    let mut uploads = recorded
        .uploads
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    uploads.push(RecordedUpload {
        product_data: product_data.clone(),
        image_names,
    });

    let mut created = json!({ "_id": format!("new-{}", uploads.len()) });
    for key in ["name_en", "bundleName"] {
        if let Some(name) = product_data.get(key) {
            created[key] = name.clone();
        }
    }
    (StatusCode::CREATED, Json(created)).into_response()
}
