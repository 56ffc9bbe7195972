//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_STATIC_DIR` - Static asset directory (default: crates/storefront/static)
//! - `BACKEND_API_URL` - Backend REST API base URL (default: <https://siraj-backend.onrender.com>)
//! - `BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `CATALOG_PAGE_SIZE` - Products per listing page (default: 12)
//! - `CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SHIPPING_FREE_THRESHOLD` - Subtotal from which shipping is free, EGP (default: 2000)
//! - `SHIPPING_FLAT_FEE` - Fallback shipping fee, EGP (default: 50)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use siraj_core::Price;
use siraj_core::checkout::{
    DEFAULT_FLAT_SHIPPING_FEE, DEFAULT_FREE_SHIPPING_THRESHOLD, ShippingPolicy,
};
use thiserror::Error;
use url::Url;

/// Default backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "https://siraj-backend.onrender.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Backend API client settings
    pub backend: BackendConfig,
    /// Shipping rules for checkout
    pub shipping: ShippingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Backend REST API settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, without the `/api` suffix
    pub api_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Default page size for listings
    pub page_size: u32,
    /// Lifetime of cached catalog reads
    pub cache_ttl: Duration,
}

impl BackendConfig {
    /// Settings pointing at `api_url` with every other value defaulted.
    #[must_use]
    pub const fn new(api_url: Url) -> Self {
        Self {
            api_url,
            timeout: Duration::from_secs(15),
            page_size: 12,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let host = vars.parse_or("STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = vars.parse_or("STOREFRONT_PORT", 3000_u16)?;
        let base_url = vars.required("STOREFRONT_BASE_URL")?;
        let static_dir = vars
            .optional("STOREFRONT_STATIC_DIR")
            .map_or_else(|| PathBuf::from("crates/storefront/static"), PathBuf::from);

        let backend = backend_from_vars(&vars)?;

        let shipping = ShippingPolicy {
            free_threshold: Price::new(vars.parse_or(
                "SHIPPING_FREE_THRESHOLD",
                Decimal::from(DEFAULT_FREE_SHIPPING_THRESHOLD),
            )?),
            flat_fee: Price::new(
                vars.parse_or("SHIPPING_FLAT_FEE", Decimal::from(DEFAULT_FLAT_SHIPPING_FEE))?,
            ),
        };
        if shipping.free_threshold.is_negative() || shipping.flat_fee.is_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "SHIPPING_*".to_string(),
                "shipping amounts cannot be negative".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            base_url,
            static_dir,
            backend,
            shipping,
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: vars.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: vars.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the session cookie must be `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn backend_from_vars(vars: &Vars<'_>) -> Result<BackendConfig, ConfigError> {
    let raw_url = vars
        .optional("BACKEND_API_URL")
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    let api_url = Url::parse(&raw_url)
        .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), e.to_string()))?;

    let page_size: u32 = vars.parse_or("CATALOG_PAGE_SIZE", 12)?;
    if page_size == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "CATALOG_PAGE_SIZE".to_string(),
            "must be at least 1".to_string(),
        ));
    }

    Ok(BackendConfig {
        api_url,
        timeout: Duration::from_secs(vars.parse_or("BACKEND_TIMEOUT_SECS", 15)?),
        page_size,
        cache_ttl: Duration::from_secs(vars.parse_or("CATALOG_CACHE_TTL_SECS", 300)?),
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    /// Get an optional, non-blank variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("STOREFRONT_BASE_URL", "http://localhost:3000")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.backend.api_url.as_str(), "https://siraj-backend.onrender.com/");
        assert_eq!(config.backend.page_size, 12);
        assert_eq!(config.backend.timeout, Duration::from_secs(15));
        assert_eq!(config.backend.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.shipping, ShippingPolicy::default());
        assert!(!config.is_secure());
    }

    #[test]
    fn test_missing_base_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "STOREFRONT_BASE_URL"));
    }

    #[test]
    fn test_invalid_values() {
        let base = ("STOREFRONT_BASE_URL", "https://siraj.example");
        assert!(load(&[base, ("STOREFRONT_PORT", "http")]).is_err());
        assert!(load(&[base, ("BACKEND_API_URL", "not a url")]).is_err());
        assert!(load(&[base, ("CATALOG_PAGE_SIZE", "0")]).is_err());
        assert!(load(&[base, ("SHIPPING_FLAT_FEE", "-5")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STOREFRONT_BASE_URL", "https://siraj.example"),
            ("STOREFRONT_PORT", "8080"),
            ("BACKEND_API_URL", "http://127.0.0.1:4000"),
            ("SHIPPING_FREE_THRESHOLD", "1500"),
            ("SHIPPING_FLAT_FEE", "65.5"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.is_secure());
        assert_eq!(config.backend.api_url.as_str(), "http://127.0.0.1:4000/");
        assert_eq!(config.shipping.free_threshold, Price::from_pounds(1500));
        assert_eq!(config.shipping.flat_fee, Price::new(Decimal::new(655, 1)));
    }
}
