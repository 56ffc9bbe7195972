//! Product creation through the admin client and the admin app.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use rust_decimal::Decimal;
use siraj_admin::client::{AdminClient, AdminClientError, ImageUpload};
use siraj_core::ProductType;
use siraj_core::product::draft::{BundleItemDraft, ProductDraft};
use siraj_integration_tests::{FakeBackend, start_admin};

fn bundle_draft() -> ProductDraft {
    ProductDraft {
        product_type: ProductType::Bundle,
        category: "Gift Set".to_string(),
        price_egp: Decimal::from(900),
        stock: 4,
        bundle_name: "Cozy Trio".to_string(),
        bundle_items: vec![
            BundleItemDraft {
                name: "Big Jar".to_string(),
                size: "Large".to_string(),
                allowed_scents: vec!["Rose".to_string(), "Oud".to_string()],
            },
            BundleItemDraft {
                name: "Mini Jar".to_string(),
                size: String::new(),
                allowed_scents: vec!["Vanilla".to_string()],
            },
        ],
        ..ProductDraft::default()
    }
}

fn image(name: &str) -> ImageUpload {
    ImageUpload::from_file_name(name, vec![0xFF, 0xD8, 0xFF, 0xE0])
}

#[tokio::test]
async fn test_client_uploads_bundle_payload_and_images() {
    let backend = FakeBackend::start().await;
    let client = AdminClient::new(&backend.admin_config()).unwrap();

    let created = client
        .create_product(&bundle_draft(), vec![image("front.jpg"), image("side.jpg")])
        .await
        .unwrap();
    assert_eq!(created.id, "new-1");
    assert_eq!(created.name, "Cozy Trio");

    let uploads = backend.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].image_names, vec!["front.jpg", "side.jpg"]);

    let data = &uploads[0].product_data;
    assert_eq!(data["productType"], "Bundle");
    assert_eq!(data["bundleName"], "Cozy Trio");
    assert_eq!(data["bundleItems"][0]["subProductName"], "Big Jar");
    assert_eq!(data["bundleItems"][0]["allowedScents"], "Rose, Oud");
    assert!(data.get("name_en").is_none());
}

#[tokio::test]
async fn test_client_rejects_too_many_images_locally() {
    let backend = FakeBackend::start().await;
    let client = AdminClient::new(&backend.admin_config()).unwrap();

    let images = (0..6).map(|i| image(&format!("{i}.jpg"))).collect();
    let err = client
        .create_product(&bundle_draft(), images)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminClientError::Draft(_)));
    assert!(backend.uploads().is_empty());
}

#[tokio::test]
async fn test_admin_form_creates_single_product() {
    let backend = FakeBackend::start().await;
    let admin = start_admin(&backend).await;

    let form = Form::new()
        .text("productType", "Single")
        .text("category", "Candles")
        .text("price_egp", "349.50")
        .text("stock", "12")
        .text("status", "Active")
        .text("featured", "on")
        .text("name_en", "Vanilla Cookie Jar")
        .text("scents", "Vanilla, Cookie")
        .part(
            "productImages",
            Part::bytes(vec![0x89, 0x50, 0x4E, 0x47])
                .file_name("jar.png")
                .mime_str("image/png")
                .unwrap(),
        );

    let response = reqwest::Client::new()
        .post(format!("{admin}/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Vanilla Cookie Jar"));
    assert!(body.contains("new-1"));

    let uploads = backend.uploads();
    assert_eq!(uploads.len(), 1);
    let data = &uploads[0].product_data;
    assert_eq!(data["name_en"], "Vanilla Cookie Jar");
    assert_eq!(data["price_egp"], 349.5);
    assert_eq!(data["scents"], "Vanilla, Cookie");
    assert_eq!(data["featured"], true);
    assert_eq!(uploads[0].image_names, vec!["jar.png"]);
}

#[tokio::test]
async fn test_admin_form_shows_validation_error() {
    let backend = FakeBackend::start().await;
    let admin = start_admin(&backend).await;

    let form = Form::new()
        .text("productType", "Bundle")
        .text("category", "Gift Set")
        .text("price_egp", "900")
        .text("bundleName", "Empty Trio")
        .part(
            "productImages",
            Part::bytes(vec![1, 2, 3]).file_name("trio.jpg"),
        );

    let response = reqwest::Client::new()
        .post(format!("{admin}/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("a bundle needs at least one item")
    );
    assert!(backend.uploads().is_empty());
}
