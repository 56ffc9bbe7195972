//! Product upload commands.
//!
//! # Usage
//!
//! ```bash
//! # Upload a candle with two photos
//! siraj-cli product create -f vanilla-jar.yaml -i front.jpg -i lid.jpg
//!
//! # Validate and print the payload without uploading
//! siraj-cli product create -f cozy-trio.yaml -i trio.jpg --dry-run
//! ```
//!
//! The YAML file holds a `ProductDraft`:
//!
//! ```yaml
//! product_type: Bundle
//! category: Gift Set
//! price_egp: 900
//! bundle_name: Cozy Trio
//! bundle_items:
//!   - name: Big Jar Candle
//!     size: Large
//!     allowed_scents: [Rose, Oud]
//! ```
//!
//! # Environment Variables
//!
//! - `BACKEND_API_URL` - Backend REST API base URL
//! - `BACKEND_TIMEOUT_SECS` - Upload timeout

use std::path::{Path, PathBuf};

use siraj_admin::client::{AdminClient, AdminClientError, CreatedProduct, ImageUpload};
use siraj_admin::config::{AdminConfig, ConfigError};
use siraj_core::product::draft::{DraftError, ProductDraft};
use thiserror::Error;

/// Errors that can occur during product commands.
#[derive(Debug, Error)]
pub enum ProductCommandError {
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The draft file is not valid YAML for a product.
    #[error("Invalid draft file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The draft failed validation.
    #[error("Invalid draft: {0}")]
    Draft(#[from] DraftError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backend did not create the product.
    #[error("Upload failed: {0}")]
    Upload(#[from] AdminClientError),
}

/// Parse a draft from YAML text.
///
/// # Errors
///
/// Returns an error if the YAML does not describe a product draft.
pub fn parse_draft(yaml: &str) -> Result<ProductDraft, ProductCommandError> {
    Ok(serde_yaml::from_str(yaml)?)
}

async fn read(path: &Path) -> Result<Vec<u8>, ProductCommandError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| ProductCommandError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn load_images(paths: &[PathBuf]) -> Result<Vec<ImageUpload>, ProductCommandError> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        images.push(ImageUpload::from_file_name(file_name, bytes));
    }
    Ok(images)
}

/// Create a product from a YAML draft and image files.
///
/// With `dry_run`, the draft is validated and its payload logged, and
/// nothing is sent.
///
/// # Errors
///
/// Returns an error if a file cannot be read, the draft is invalid, or the
/// backend rejects the upload.
pub async fn create(
    file: &Path,
    image_paths: &[PathBuf],
    dry_run: bool,
) -> Result<Option<CreatedProduct>, ProductCommandError> {
    let yaml = String::from_utf8_lossy(&read(file).await?).into_owned();
    let draft = parse_draft(&yaml)?;

    if dry_run {
        let payload = draft.payload(image_paths.len())?;
        tracing::info!(
            name = %draft.name(),
            images = image_paths.len(),
            "Draft is valid: {payload}"
        );
        return Ok(None);
    }

    // Fail on the draft before reading any image files
    draft.validate(image_paths.len())?;
    let images = load_images(image_paths).await?;

    let config = AdminConfig::from_env()?;
    let client = AdminClient::new(&config)?;

    tracing::info!(
        name = %draft.name(),
        backend = %config.backend_url,
        "Uploading product..."
    );
    let created = client.create_product(&draft, images).await?;
    tracing::info!("Created product {} (ID {})", created.name, created.id);

    Ok(Some(created))
}
