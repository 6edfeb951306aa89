//! Application state shared across handlers.
//!
//! Holds the two page-wide stores (catalog and cart), the add-to-cart
//! cooldown timers and the receipts waiting to be downloaded. Handlers
//! never keep copies of the stores: every render takes a fresh snapshot.
//!
//! Lock order is always catalog, then cart.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use kirana_core::render::{self, CartBadgeView, CartPanelView, ProductCardView, StorefrontView};
use kirana_core::{
    CartStore, CatalogStore, CategoryFilter, KeyValueStore, Product, ProductId, ReceiptDocument,
    StorageError,
};
use uuid::Uuid;

use crate::config::StorefrontConfig;
use crate::cooldown::Cooldowns;
use crate::error::{AppError, Result};
use crate::storage::FileStore;

/// Cart storage as seen by the application.
pub type SharedStorage = Box<dyn KeyValueStore + Send + Sync>;

/// Receipts kept for download before the oldest is evicted.
const MAX_PENDING_RECEIPTS: usize = 16;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: RwLock<CatalogState>,
    cart: Mutex<CartStore<SharedStorage>>,
    cooldowns: Cooldowns,
    receipts: Mutex<VecDeque<(Uuid, ReceiptDocument)>>,
}

#[derive(Default)]
struct CatalogState {
    store: CatalogStore,
    failure: Option<String>,
}

/// A category filter control.
#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub label: String,
    pub active: bool,
}

/// Everything the templates need to draw the widget.
#[derive(Debug, Clone)]
pub struct WidgetSnapshot {
    pub view: StorefrontView,
    pub categories: Vec<CategoryLink>,
    pub filter: String,
    /// The catalog fetch has not finished yet.
    pub loading: bool,
    /// The catalog fetch failed; `failure_message` says why.
    pub failed: bool,
    pub failure_message: String,
}

impl AppState {
    /// Create a new application state with the cart restored from `storage`.
    ///
    /// The catalog starts empty; see [`crate::catalog::load_catalog_async`].
    #[must_use]
    pub fn new(config: StorefrontConfig, storage: SharedStorage) -> Self {
        let cooldowns = Cooldowns::new(config.add_cooldown);
        let cart = CartStore::load(storage);
        tracing::info!(lines = cart.lines().len(), "Cart restored");

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog: RwLock::new(CatalogState::default()),
                cart: Mutex::new(cart),
                cooldowns,
                receipts: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Create state backed by a [`FileStore`] in the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn with_file_storage(config: StorefrontConfig) -> std::result::Result<Self, StorageError> {
        let storage = FileStore::open(&config.data_dir)?;
        Ok(Self::new(config, Box::new(storage)))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the add-to-cart cooldown timers.
    #[must_use]
    pub fn cooldowns(&self) -> &Cooldowns {
        &self.inner.cooldowns
    }

    /// Replace the whole catalog and clear any recorded failure.
    pub fn replace_catalog(&self, products: Vec<Product>) {
        let mut catalog = self
            .inner
            .catalog
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        catalog.store.replace(products);
        catalog.failure = None;
    }

    /// Record that the catalog could not be loaded. Existing products are kept.
    pub fn record_catalog_failure(&self, message: String) {
        let mut catalog = self
            .inner
            .catalog
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        catalog.failure = Some(message);
    }

    /// Whether the catalog has been loaded.
    #[must_use]
    pub fn catalog_ready(&self) -> bool {
        self.inner
            .catalog
            .read()
            .map(|c| c.store.is_loaded())
            .unwrap_or(false)
    }

    /// Run `f` against the catalog and the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock is poisoned or `f` fails.
    pub fn with_stores<T>(
        &self,
        f: impl FnOnce(&CatalogStore, &mut CartStore<SharedStorage>) -> Result<T>,
    ) -> Result<T> {
        let catalog = self
            .inner
            .catalog
            .read()
            .map_err(|_| AppError::Internal("Catalog lock poisoned".to_string()))?;
        let mut cart = self
            .inner
            .cart
            .lock()
            .map_err(|_| AppError::Internal("Cart lock poisoned".to_string()))?;
        f(&catalog.store, &mut cart)
    }

    /// Project the stores into a full widget snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock is poisoned.
    pub fn snapshot(&self, filter: &CategoryFilter) -> Result<WidgetSnapshot> {
        let catalog = self
            .inner
            .catalog
            .read()
            .map_err(|_| AppError::Internal("Catalog lock poisoned".to_string()))?;
        let cart = self
            .inner
            .cart
            .lock()
            .map_err(|_| AppError::Internal("Cart lock poisoned".to_string()))?;

        let currency = self.config().currency;
        let products = catalog.store.filter(filter);
        let view = render::render(&products, &*cart, self.cooldowns(), currency);

        let mut categories = vec![CategoryLink {
            label: CategoryFilter::All.label().to_string(),
            active: *filter == CategoryFilter::All,
        }];
        categories.extend(catalog.store.categories().into_iter().map(|label| {
            CategoryLink {
                label: label.to_string(),
                active: filter.matches(label) && *filter != CategoryFilter::All,
            }
        }));

        Ok(WidgetSnapshot {
            view,
            categories,
            filter: filter.label().to_string(),
            loading: !catalog.store.is_loaded() && catalog.failure.is_none(),
            failed: catalog.failure.is_some(),
            failure_message: catalog.failure.clone().unwrap_or_default(),
        })
    }

    /// Render a single product card.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product is not in the catalog.
    pub fn product_card(&self, id: ProductId) -> Result<ProductCardView> {
        self.with_stores(|catalog, cart| {
            let product = catalog
                .get(id)
                .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
            Ok(render::product_card(
                product,
                cart,
                self.cooldowns(),
                self.config().currency,
            ))
        })
    }

    /// Render the cart panel and badge.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock is poisoned.
    pub fn cart_views(&self) -> Result<(CartPanelView, CartBadgeView, String)> {
        self.with_stores(|_, cart| {
            let currency = self.config().currency;
            Ok((
                render::cart_panel(cart, currency),
                render::badge(cart),
                render::subtotal(cart, currency),
            ))
        })
    }

    /// Keep a receipt for one download and return its token.
    pub fn stash_receipt(&self, document: ReceiptDocument) -> Uuid {
        let token = Uuid::new_v4();
        let mut receipts = self
            .inner
            .receipts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if receipts.len() >= MAX_PENDING_RECEIPTS {
            receipts.pop_front();
        }
        receipts.push_back((token, document));
        token
    }

    /// Remove and return the receipt for `token`.
    #[must_use]
    pub fn take_receipt(&self, token: Uuid) -> Option<ReceiptDocument> {
        let mut receipts = self
            .inner
            .receipts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let index = receipts.iter().position(|(t, _)| *t == token)?;
        receipts.remove(index).map(|(_, document)| document)
    }
}
