//! Product upload client for the Siraj backend.
//!
//! `POST /api/products` takes a multipart body: every image under
//! `productImages` and the validated [`ProductDraft`] payload as a JSON
//! string under `productData`.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use siraj_core::product::draft::{DraftError, ProductDraft};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::AdminConfig;

/// Multipart field carrying the images.
pub const IMAGES_FIELD: &str = "productImages";

/// Multipart field carrying the JSON payload.
pub const DATA_FIELD: &str = "productData";

/// Errors that can occur while creating a product.
#[derive(Debug, Error)]
pub enum AdminClientError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The draft did not pass validation; nothing was sent.
    #[error("{0}")]
    Draft(#[from] DraftError),

    /// The backend refused the product with a message.
    #[error("{0}")]
    Rejected(String),

    /// Non-success status without a usable message.
    #[error("Backend returned HTTP {status}")]
    Status { status: u16 },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An image file attached to a draft.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Guess the content type from the file extension.
    #[must_use]
    pub fn from_file_name(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let content_type = match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        };
        Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        }
    }
}

/// The product the backend created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProduct {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct RawCreated {
    #[serde(rename = "_id", alias = "id")]
    id: Option<String>,
    name_en: Option<String>,
    #[serde(rename = "bundleName")]
    bundle_name: Option<String>,
    message: Option<String>,
}

/// Client for product creation.
#[derive(Clone)]
pub struct AdminClient {
    client: reqwest::Client,
    base_url: Url,
}

impl AdminClient {
    /// Create a client from the admin configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AdminConfig) -> Result<Self, AdminClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .user_agent(concat!("siraj-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.backend_url.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/api/products",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    /// Validate `draft` and upload it with its images.
    ///
    /// # Errors
    ///
    /// Returns [`AdminClientError::Draft`] before any request is made when
    /// validation fails, otherwise the backend or transport error.
    #[instrument(skip(self, draft, images), fields(name = %draft.name(), images = images.len()))]
    pub async fn create_product(
        &self,
        draft: &ProductDraft,
        images: Vec<ImageUpload>,
    ) -> Result<CreatedProduct, AdminClientError> {
        let payload = draft.payload(images.len())?;

        let mut form = Form::new();
        for image in images {
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(&image.content_type)?;
            form = form.part(IMAGES_FIELD, part);
        }
        form = form.text(DATA_FIELD, payload.to_string());

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Product upload rejected"
            );
            let message = serde_json::from_str::<RawCreated>(&body)
                .ok()
                .and_then(|raw| raw.message)
                .filter(|m| !m.trim().is_empty());
            return Err(message.map_or(
                AdminClientError::Status {
                    status: status.as_u16(),
                },
                AdminClientError::Rejected,
            ));
        }

        let raw: RawCreated = serde_json::from_str(&body)?;
        let created = CreatedProduct {
            id: raw.id.unwrap_or_default(),
            name: raw
                .name_en
                .or(raw.bundle_name)
                .unwrap_or_else(|| draft.name().to_string()),
        };
        tracing::info!(id = %created.id, "Product created");
        Ok(created)
    }
}
