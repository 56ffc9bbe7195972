//! Browse, cart and checkout through the storefront, backed by the fake
//! backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use siraj_core::ProductId;
use siraj_core::cart::compute_unique_id;
use siraj_integration_tests::{FakeBackend, browser, start_storefront};

const CHECKOUT_FORM: [(&str, &str); 6] = [
    ("name", "Mona"),
    ("email", "mona@example.com"),
    ("phone", "01000000000"),
    ("address", "12 Nile St"),
    ("city", "Cairo"),
    ("payment_method", "cod"),
];

#[tokio::test]
async fn test_catalog_pages() {
    let backend = FakeBackend::start().await;
    let storefront = start_storefront(&backend).await;
    let client = browser();

    let home = client.get(&storefront).send().await.unwrap();
    assert_eq!(home.status(), StatusCode::OK);
    let home = home.text().await.unwrap();
    assert!(home.contains("Amber Jar"));
    assert!(home.contains("/products?category=Gift+Set"));

    let diffusers = client
        .get(format!("{storefront}/products?category=Diffusers"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(diffusers.contains("Reed Diffuser"));
    assert!(!diffusers.contains("Amber Jar"));

    let bundles = client
        .get(format!("{storefront}/bundles"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(bundles.contains("Cozy Trio"));

    let missing = client
        .get(format!("{storefront}/products/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bundle_requires_a_scent_per_item() {
    let backend = FakeBackend::start().await;
    let storefront = start_storefront(&backend).await;
    let client = browser();

    let response = client
        .post(format!("{storefront}/cart/add"))
        .form(&[("product_id", "b-trio"), ("bundle_scent_0", "Rose")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.headers().get("HX-Trigger").is_none());

    let count = client
        .get(format!("{storefront}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(count.contains(">0<"));
}

#[tokio::test]
async fn test_add_to_cart_and_checkout_with_discount() {
    let backend = FakeBackend::start().await;
    let storefront = start_storefront(&backend).await;
    let client = browser();

    // Empty cart cannot check out
    let early = client
        .get(format!("{storefront}/checkout"))
        .send()
        .await
        .unwrap();
    assert!(early.url().path().ends_with("/cart"));

    let added = client
        .post(format!("{storefront}/cart/add"))
        .form(&[("product_id", "p-amber"), ("scent", "Oud"), ("quantity", "2")])
        .send()
        .await
        .unwrap();
    assert_eq!(added.status(), StatusCode::OK);
    assert_eq!(added.headers()["HX-Trigger"], "cart-updated");

    let count = client
        .get(format!("{storefront}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(count.contains(">2<"));

    let summary = client
        .post(format!("{storefront}/checkout/discount"))
        .form(&[("code", "WELCOME10"), ("city", "Cairo")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(summary.contains("WELCOME10"));
    assert!(summary.contains("500.00 EGP"));

    let confirmation = client
        .post(format!("{storefront}/checkout"))
        .form(&[
            ("name", "Mona"),
            ("email", "mona@example.com"),
            ("phone", "01000000000"),
            ("address", "12 Nile St"),
            ("city", "Cairo"),
            ("payment_method", "cod"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(confirmation.status(), StatusCode::OK);
    assert!(confirmation.text().await.unwrap().contains("ORD-1"));

    // 2 x 250 + 50 Cairo shipping - 10% of 500
    let orders = backend.orders();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order["subtotal"], 500.0);
    assert_eq!(order["shippingFee"], 50.0);
    assert_eq!(order["discountCode"], "WELCOME10");
    // Once when applied, once more before ordering
    assert_eq!(backend.hits("/api/discounts/validate"), 2);
    assert_eq!(order["totalAmount"], 500.0);
    assert_eq!(order["paymentMethod"], "Cash on Delivery");
    assert_eq!(order["items"][0]["customizationSelections"][0], "Oud");

    let count = client
        .get(format!("{storefront}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(count.contains(">0<"));
}

#[tokio::test]
async fn test_rejected_order_keeps_the_cart() {
    let backend = FakeBackend::start().await;
    let storefront = start_storefront(&backend).await;
    let client = browser();

    // Each add is capped at stock (5), so go over it in three adds
    for _ in 0..3 {
        client
            .post(format!("{storefront}/cart/add"))
            .form(&[("product_id", "p-amber"), ("scent", "Amber"), ("quantity", "2")])
            .send()
            .await
            .unwrap();
    }

    let response = client
        .post(format!("{storefront}/checkout"))
        .form(&[
            ("name", "Mona"),
            ("email", "mona@example.com"),
            ("phone", "01000000000"),
            ("address", "12 Nile St"),
            ("city", "Alexandria"),
            ("payment_method", "card"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("left in stock"));
    assert!(backend.orders().is_empty());

    let count = client
        .get(format!("{storefront}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(count.contains(">6<"));
}

#[tokio::test]
async fn test_discount_is_rechecked_after_cart_shrinks() {
    let backend = FakeBackend::start().await;
    let storefront = start_storefront(&backend).await;
    let client = browser();

    client
        .post(format!("{storefront}/cart/add"))
        .form(&[("product_id", "p-amber"), ("scent", "Oud"), ("quantity", "4")])
        .send()
        .await
        .unwrap();

    let applied = client
        .post(format!("{storefront}/checkout/discount"))
        .form(&[("code", "BIG100"), ("city", "Cairo")])
        .send()
        .await
        .unwrap();
    assert_eq!(applied.status(), StatusCode::OK);
    assert!(applied.text().await.unwrap().contains("BIG100"));

    let line = compute_unique_id(&ProductId::new("p-amber"), &["Oud".to_string()], None);
    let updated = client
        .post(format!("{storefront}/cart/update"))
        .form(&[("line_id", line.as_str()), ("quantity", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);

    // The coupon was accepted at 1000 EGP; the cart is now 250 EGP
    let refused = client
        .post(format!("{storefront}/checkout"))
        .form(&CHECKOUT_FORM)
        .send()
        .await
        .unwrap();
    assert_eq!(refused.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(refused.text().await.unwrap().contains("needs an order of 1000 EGP"));
    assert!(backend.orders().is_empty());

    let checks = backend.discount_checks();
    assert_eq!(checks.len(), 2);
    assert_eq!(checks[0]["cartTotal"], 1000.0);
    assert_eq!(checks[1]["cartTotal"], 250.0);

    // The stale coupon is gone, so the retry goes through at full price
    let placed = client
        .post(format!("{storefront}/checkout"))
        .form(&CHECKOUT_FORM)
        .send()
        .await
        .unwrap();
    assert_eq!(placed.status(), StatusCode::OK);
    assert_eq!(backend.discount_checks().len(), 2);

    let orders = backend.orders();
    assert_eq!(orders.len(), 1);
    assert!(orders[0]["discountCode"].is_null());
    assert_eq!(orders[0]["subtotal"], 250.0);
    assert_eq!(orders[0]["totalAmount"], 300.0);
}
