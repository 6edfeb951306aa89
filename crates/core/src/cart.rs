//! Persistent cart.
//!
//! [`CartStore`] owns the cart lines and the storage slot they live in.
//! Every mutator writes the full line list back to storage before it
//! returns, so the persisted form never lags the in-memory one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::catalog::CatalogStore;
use crate::storage::{KeyValueStore, StorageError};
use crate::types::{CurrencyCode, Price, Product, ProductId};

/// Storage slot holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "cart";

/// Errors returned by cart mutators.
#[derive(Debug, Error)]
pub enum CartError {
    /// The in-memory cart changed but could not be written back.
    #[error("failed to persist cart: {0}")]
    Persist(#[from] StorageError),
}

/// A product snapshot plus the quantity ordered.
///
/// Serializes as the product's fields with `quantity` alongside, e.g.
/// `{"product_id": 1, "name": "...", ..., "quantity": 2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Identifier of the product this line holds.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.product_id
    }

    /// `price × quantity`, saturating at the largest representable amount.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// The active cart, bound to its storage slot.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    lines: Vec<CartLine>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Restore the cart from `storage`.
    ///
    /// A missing, unreadable or malformed slot yields an empty cart. Lines
    /// with a zero quantity are dropped and duplicate product identifiers
    /// are merged so the loaded cart upholds the same invariants as one
    /// built through the mutators.
    pub fn load(storage: S) -> Self {
        let lines = match storage.get_json::<Vec<CartLine>>(CART_STORAGE_KEY) {
            Ok(Some(lines)) => normalize(lines),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted cart");
                Vec::new()
            }
        };

        Self { storage, lines }
    }

    /// Add one unit of `id`, creating the line from the catalog if needed.
    ///
    /// Returns the line's new quantity, or `None` when the product is not
    /// in the catalog (nothing changes in that case).
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn add_or_increment(
        &mut self,
        catalog: &CatalogStore,
        id: ProductId,
    ) -> Result<Option<u32>, CartError> {
        let quantity = if let Some(line) = self.line_mut(id) {
            line.quantity = line.quantity.saturating_add(1);
            line.quantity
        } else {
            let Some(product) = catalog.get(id) else {
                return Ok(None);
            };
            self.lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
            });
            1
        };

        self.persist()?;
        Ok(Some(quantity))
    }

    /// Add `delta` to the quantity of `id`.
    ///
    /// A result of zero or below removes the line. Returns the remaining
    /// quantity, or `None` when the line was removed or never existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn change_quantity(&mut self, id: ProductId, delta: i64) -> Result<Option<u32>, CartError> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        let remaining = self
            .lines
            .get(index)
            .map_or(0, |line| i64::from(line.quantity).saturating_add(delta));

        let quantity = if remaining <= 0 {
            self.lines.remove(index);
            None
        } else {
            let quantity = u32::try_from(remaining).unwrap_or(u32::MAX);
            if let Some(line) = self.lines.get_mut(index) {
                line.quantity = quantity;
            }
            Some(quantity)
        };

        self.persist()?;
        Ok(quantity)
    }

    /// Delete the line for `id`. Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn remove(&mut self, id: ProductId) -> Result<bool, CartError> {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id() != id);
        let removed = self.lines.len() != before;

        self.persist()?;
        Ok(removed)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.lines.clear();
        self.persist()?;
        Ok(())
    }

    fn persist(&self) -> Result<(), StorageError> {
        self.storage.set_json(CART_STORAGE_KEY, &self.lines)
    }
}

impl<S> CartStore<S> {
    /// Lines in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id() == id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines (the badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |sum, line| sum.saturating_add(line.quantity))
    }

    /// Sum of every line's subtotal, saturating like [`CartLine::subtotal`].
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.lines
            .iter()
            .fold(Decimal::ZERO, |sum, line| sum.saturating_add(line.subtotal()))
    }

    /// Cart total as a price in `currency`.
    #[must_use]
    pub fn total(&self, currency: CurrencyCode) -> Price {
        Price::new(self.total_amount(), currency)
    }

    /// The backing storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.product_id() == id)
    }

    fn position(&self, id: ProductId) -> Option<usize> {
        self.lines.iter().position(|line| line.product_id() == id)
    }
}

/// Drop empty lines and merge duplicates, keeping first-seen order.
fn normalize(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            continue;
        }
        if let Some(existing) = merged
            .iter_mut()
            .find(|l| l.product_id() == line.product_id())
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            merged.push(line);
        }
    }
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::catalog::tests::product;
    use crate::storage::MemoryStore;

    fn catalog() -> CatalogStore {
        CatalogStore::from_products(vec![
            product(1, Decimal::new(1000, 2), "Snacks"),
            product(2, Decimal::new(550, 2), "Beverages"),
            product(3, Decimal::new(1999, 2), "Sweets"),
        ])
    }

    fn persisted(store: &MemoryStore) -> Vec<CartLine> {
        store.get_json(CART_STORAGE_KEY).unwrap().unwrap_or_default()
    }

    fn quantities<S>(cart: &CartStore<S>) -> Vec<(i64, u32)> {
        cart.lines()
            .iter()
            .map(|l| (l.product_id().as_i64(), l.quantity))
            .collect()
    }

    #[test]
    fn test_add_twice_then_other() {
        let catalog = catalog();
        let mut cart = CartStore::load(MemoryStore::new());

        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();
        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();
        cart.add_or_increment(&catalog, ProductId::new(2)).unwrap();

        assert_eq!(quantities(&cart), vec![(1, 2), (2, 1)]);
        assert_eq!(cart.total_amount(), Decimal::new(2550, 2));
        assert_eq!(cart.total(CurrencyCode::INR).display(), "₹25.50");
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_unknown_product_is_noop() {
        let store = MemoryStore::new();
        let mut cart = CartStore::load(store.clone());

        let result = cart.add_or_increment(&catalog(), ProductId::new(42)).unwrap();

        assert_eq!(result, None);
        assert!(cart.is_empty());
        assert!(store.get(CART_STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_line_is_independent_snapshot() {
        let mut catalog = catalog();
        let mut cart = CartStore::load(MemoryStore::new());
        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();

        catalog.replace(vec![product(1, Decimal::new(1, 0), "Changed")]);

        let line = cart.line(ProductId::new(1)).unwrap();
        assert_eq!(line.product.price, Decimal::new(1000, 2));
        assert_eq!(line.product.category, "Snacks");
    }

    #[test]
    fn test_change_quantity_increments() {
        let catalog = catalog();
        let mut cart = CartStore::load(MemoryStore::new());
        cart.add_or_increment(&catalog, ProductId::new(3)).unwrap();

        assert_eq!(cart.change_quantity(ProductId::new(3), 4).unwrap(), Some(5));
        assert_eq!(cart.line(ProductId::new(3)).unwrap().quantity, 5);
    }

    #[test]
    fn test_change_quantity_below_zero_removes_line() {
        let catalog = catalog();
        let mut cart = CartStore::load(MemoryStore::new());
        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();
        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();

        assert_eq!(cart.change_quantity(ProductId::new(1), -5).unwrap(), None);

        assert!(cart.line(ProductId::new(1)).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_change_quantity_to_exact_zero_removes_line() {
        let catalog = catalog();
        let mut cart = CartStore::load(MemoryStore::new());
        cart.add_or_increment(&catalog, ProductId::new(2)).unwrap();

        cart.change_quantity(ProductId::new(2), -1).unwrap();
        assert!(cart.line(ProductId::new(2)).is_none());

        // Subsequent operations treat the id as absent
        assert_eq!(cart.change_quantity(ProductId::new(2), 1).unwrap(), None);
        assert!(!cart.remove(ProductId::new(2)).unwrap());
    }

    #[test]
    fn test_change_quantity_missing_line_is_noop() {
        let mut cart = CartStore::load(MemoryStore::new());
        assert_eq!(cart.change_quantity(ProductId::new(1), 3).unwrap(), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_huge_totals_saturate() {
        let catalog = CatalogStore::from_products(vec![
            product(1, Decimal::MAX, "Snacks"),
            product(2, Decimal::new(1000, 2), "Snacks"),
        ]);
        let mut cart = CartStore::load(MemoryStore::new());
        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();
        cart.add_or_increment(&catalog, ProductId::new(2)).unwrap();

        let quantity = cart
            .change_quantity(ProductId::new(1), i64::from(u32::MAX))
            .unwrap();

        assert_eq!(quantity, Some(u32::MAX));
        assert_eq!(cart.line(ProductId::new(1)).unwrap().subtotal(), Decimal::MAX);
        assert_eq!(cart.total_amount(), Decimal::MAX);
        assert!(cart.total(CurrencyCode::INR).display().starts_with('₹'));
    }

    #[test]
    fn test_remove() {
        let catalog = catalog();
        let mut cart = CartStore::load(MemoryStore::new());
        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();
        cart.add_or_increment(&catalog, ProductId::new(2)).unwrap();

        assert!(cart.remove(ProductId::new(1)).unwrap());
        assert_eq!(quantities(&cart), vec![(2, 1)]);
    }

    #[test]
    fn test_clear() {
        let catalog = catalog();
        let store = MemoryStore::new();
        let mut cart = CartStore::load(store.clone());
        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();

        cart.clear().unwrap();

        assert!(cart.is_empty());
        assert!(persisted(&store).is_empty());
        assert_eq!(cart.total_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_every_mutator_persists() {
        let catalog = catalog();
        let store = MemoryStore::new();
        let mut cart = CartStore::load(store.clone());

        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();
        assert_eq!(persisted(&store), cart.lines());

        cart.add_or_increment(&catalog, ProductId::new(3)).unwrap();
        assert_eq!(persisted(&store), cart.lines());

        cart.change_quantity(ProductId::new(1), 2).unwrap();
        assert_eq!(persisted(&store), cart.lines());

        cart.remove(ProductId::new(3)).unwrap();
        assert_eq!(persisted(&store), cart.lines());
    }

    #[test]
    fn test_persist_then_reload_roundtrip() {
        let catalog = catalog();
        let store = MemoryStore::new();
        let mut cart = CartStore::load(store.clone());
        cart.add_or_increment(&catalog, ProductId::new(2)).unwrap();
        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();
        cart.change_quantity(ProductId::new(1), 3).unwrap();

        let reloaded = CartStore::load(store);

        assert_eq!(reloaded.lines(), cart.lines());
    }

    #[test]
    fn test_persisted_shape_is_flat() {
        let catalog = catalog();
        let store = MemoryStore::new();
        let mut cart = CartStore::load(store.clone());
        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();

        let raw = store.get(CART_STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &value[0];
        assert_eq!(first["product_id"], 1);
        assert_eq!(first["quantity"], 1);
        assert_eq!(first["name"], "Product 1");
    }

    #[test]
    fn test_load_malformed_slot_is_empty() {
        let cart = CartStore::load(MemoryStore::with_value(CART_STORAGE_KEY, "{not json"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_load_legacy_numeric_prices() {
        let raw = r#"[{"product_id":1,"name":"Chai","price":10,"category":"Beverages",
            "description":"","image_url":"","quantity":2}]"#;
        let cart = CartStore::load(MemoryStore::with_value(CART_STORAGE_KEY, raw));
        assert_eq!(cart.total_amount(), Decimal::new(20, 0));
    }

    #[test]
    fn test_load_normalizes_zero_and_duplicate_lines() {
        let raw = r#"[
            {"product_id":1,"name":"A","price":"1.00","category":"X","quantity":2},
            {"product_id":2,"name":"B","price":"2.00","category":"X","quantity":0},
            {"product_id":1,"name":"A","price":"1.00","category":"X","quantity":3}
        ]"#;
        let cart = CartStore::load(MemoryStore::with_value(CART_STORAGE_KEY, raw));
        assert_eq!(quantities(&cart), vec![(1, 5)]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(i64),
        Change(i64, i64),
        Remove(i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1_i64..=4).prop_map(Op::Add),
            ((1_i64..=4), (-3_i64..=3)).prop_map(|(id, d)| Op::Change(id, d)),
            (1_i64..=4).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_repeated_adds_count_calls(n in 1_u32..50) {
            let catalog = catalog();
            let mut cart = CartStore::load(MemoryStore::new());
            for _ in 0..n {
                cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();
            }
            prop_assert_eq!(cart.lines().len(), 1);
            prop_assert_eq!(cart.line(ProductId::new(1)).map(|l| l.quantity), Some(n));
        }

        #[test]
        fn prop_invariants_hold_after_every_mutation(ops in proptest::collection::vec(op(), 0..40)) {
            let catalog = catalog();
            let store = MemoryStore::new();
            let mut cart = CartStore::load(store.clone());
            for op in ops {
                match op {
                    Op::Add(id) => { cart.add_or_increment(&catalog, ProductId::new(id)).unwrap(); }
                    Op::Change(id, d) => { cart.change_quantity(ProductId::new(id), d).unwrap(); }
                    Op::Remove(id) => { cart.remove(ProductId::new(id)).unwrap(); }
                }

                let expected: Decimal = cart
                    .lines()
                    .iter()
                    .map(|l| l.product.price * Decimal::from(l.quantity))
                    .sum();
                prop_assert_eq!(cart.total_amount(), expected);
                prop_assert!(cart.lines().iter().all(|l| l.quantity >= 1));

                let mut ids: Vec<i64> = cart.lines().iter().map(|l| l.product_id().as_i64()).collect();
                ids.sort_unstable();
                ids.dedup();
                prop_assert_eq!(ids.len(), cart.lines().len());

                prop_assert_eq!(persisted(&store), cart.lines().to_vec());
            }
        }
    }
}
