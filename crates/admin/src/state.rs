//! Application state shared across handlers.

use std::sync::Arc;

use crate::client::{AdminClient, AdminClientError};
use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    client: AdminClient,
}

impl AppState {
    /// Build state and the backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, AdminClientError> {
        let client = AdminClient::new(&config)?;
        Ok(Self {
            inner: Arc::new(AppStateInner { config, client }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn client(&self) -> &AdminClient {
        &self.inner.client
    }
}
