//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_STATIC_DIR` - Static asset directory (default: crates/admin/static)
//! - `ADMIN_UPLOAD_LIMIT_MB` - Maximum multipart body size (default: 25)
//! - `BACKEND_API_URL` - Backend REST API base URL (default: <https://siraj-backend.onrender.com>)
//! - `BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Largest accepted upload request, in bytes
    pub upload_limit: usize,
    /// Backend base URL, without the `/api` suffix
    pub backend_url: Url,
    /// Backend request timeout (uploads carry images, so this is generous)
    pub backend_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let raw_url = vars
            .optional("BACKEND_API_URL")
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let backend_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), e.to_string())
        })?;

        let upload_limit_mb: usize = vars.parse_or("ADMIN_UPLOAD_LIMIT_MB", 25)?;
        if upload_limit_mb == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_UPLOAD_LIMIT_MB".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host: vars.parse_or("ADMIN_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: vars.parse_or("ADMIN_PORT", 3001_u16)?,
            static_dir: vars
                .optional("ADMIN_STATIC_DIR")
                .map_or_else(|| PathBuf::from("crates/admin/static"), PathBuf::from),
            upload_limit: upload_limit_mb.saturating_mul(1024 * 1024),
            backend_url,
            backend_timeout: Duration::from_secs(vars.parse_or("BACKEND_TIMEOUT_SECS", 60)?),
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
}

struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

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
