//! Read-only product catalog.
//!
//! The catalog is fetched once per session from a [`CatalogSource`]. A
//! successful load replaces the whole product list; a failed load leaves
//! the previous list untouched and hands the error back to the host.

use core::future::Future;

use crate::types::{CategoryFilter, Product, ProductId};

/// Remote product collection.
pub trait CatalogSource {
    /// Error produced when the collection cannot be fetched or decoded.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the full, ordered product collection.
    fn fetch(&self) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send;
}

/// The products available for this session, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    products: Vec<Product>,
    loaded: bool,
}

impl CatalogStore {
    /// Create an empty, not yet loaded catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            products: Vec::new(),
            loaded: false,
        }
    }

    /// Create a catalog that is already loaded with `products`.
    #[must_use]
    pub const fn from_products(products: Vec<Product>) -> Self {
        Self {
            products,
            loaded: true,
        }
    }

    /// Fetch from `source` and replace the product list on success.
    ///
    /// Returns the number of products loaded.
    ///
    /// # Errors
    ///
    /// Returns the source's error; the current product list is kept.
    pub async fn load<S: CatalogSource>(&mut self, source: &S) -> Result<usize, S::Error> {
        let products = source.fetch().await?;
        self.replace(products);
        Ok(self.products.len())
    }

    /// Replace the entire product list.
    pub fn replace(&mut self, products: Vec<Product>) {
        self.products = products;
        self.loaded = true;
    }

    /// Whether a load has completed successfully.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// All products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by identifier.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.product_id == id)
    }

    /// Products passing `filter`, preserving catalog order.
    #[must_use]
    pub fn filter(&self, filter: &CategoryFilter) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| filter.matches(&p.category))
            .collect()
    }

    /// Distinct category labels in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for product in &self.products {
            if !seen.contains(&product.category.as_str()) {
                seen.push(&product.category);
            }
        }
        seen
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
