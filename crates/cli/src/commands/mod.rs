//! Command implementations.
//!
//! Each command opens the cart from the data directory, does its work and
//! writes a human-readable summary to the given writer.

pub mod cart;
pub mod catalog;
pub mod checkout;

use std::io;

use kirana_core::{CartError, CartStore, CatalogStore, CheckoutError, CurrencyCode, StorageError};
use kirana_storefront::catalog::{CatalogError, HttpCatalog};
use kirana_storefront::config::{ConfigError, StorefrontConfig};
use kirana_storefront::storage::FileStore;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The data directory could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cart could not be saved.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// The catalog could not be fetched.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Checkout failed after input was collected.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    config: StorefrontConfig,
}

impl Context {
    pub const fn new(config: StorefrontConfig) -> Self {
        Self { config }
    }

    pub const fn currency(&self) -> CurrencyCode {
        self.config.currency
    }

    /// Open the persisted cart.
    pub fn open_cart(&self) -> Result<CartStore<FileStore>, CliError> {
        let storage = FileStore::open(&self.config.data_dir)?;
        Ok(CartStore::load(storage))
    }

    /// Fetch the catalog from the configured endpoint.
    pub async fn fetch_catalog(&self) -> Result<CatalogStore, CliError> {
        let source = HttpCatalog::new(self.config.catalog_url.clone());
        let mut catalog = CatalogStore::new();
        let count = catalog.load(&source).await?;
        tracing::debug!(products = count, endpoint = %source.endpoint(), "Catalog fetched");
        Ok(catalog)
    }
}
