//! HTTP catalog client and background catalog loading.
//!
//! The catalog endpoint returns a JSON array of product records. It is
//! fetched once at startup by a background task; until it completes the
//! widget shows a loading indicator, and if it fails the widget shows an
//! error notice instead of an empty grid.

use kirana_core::{CatalogSource, Product};
use thiserror::Error;
use tracing::{error, info, instrument};
use url::Url;

use crate::state::AppState;

/// Errors that can occur when fetching the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("catalog endpoint returned {0}")]
    Status(reqwest::StatusCode),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for the remote product catalog.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpCatalog {
    /// Create a catalog client for `endpoint`.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// The catalog endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl CatalogSource for HttpCatalog {
    type Error = CatalogError;

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch(&self) -> Result<Vec<Product>, CatalogError> {
        let response = self.client.get(self.endpoint.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }

        let body = response.bytes().await?;
        let products: Vec<Product> = serde_json::from_slice(&body)?;
        Ok(products)
    }
}

/// Spawn a background task that loads the catalog into `state`.
///
/// The storefront serves requests immediately; product routes show a
/// loading indicator until the task finishes.
pub fn load_catalog_async(state: AppState, source: HttpCatalog) {
    info!(endpoint = %source.endpoint(), "Spawning catalog load task");
    tokio::spawn(async move {
        load_catalog(&state, &source).await;
    });
}

/// Fetch the catalog once and record the result in `state`.
pub async fn load_catalog<S: CatalogSource>(state: &AppState, source: &S) {
    match source.fetch().await {
        Ok(products) => {
            let count = products.len();
            state.replace_catalog(products);
            info!(products = count, "Catalog loaded");
        }
        Err(e) => {
            error!(error = %e, "Failed to load catalog");
            state.record_catalog_failure(e.to_string());
        }
    }
}
