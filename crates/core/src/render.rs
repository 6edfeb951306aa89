//! View-model projection of the catalog and cart.
//!
//! Every function here is a pure read of the stores: nothing is cached
//! between calls and hosts are expected to re-project after each mutation.
//! Hosts turn the resulting views into markup (HTML templates, terminal
//! tables, ...).

use std::time::Duration;

use crate::cart::{CartLine, CartStore};
use crate::types::{CurrencyCode, Price, Product, ProductId};

/// Label of the add button for a product not yet in the cart.
pub const ADD_TO_CART_LABEL: &str = "Add to Cart";

/// Text shown in place of the cart lines when the cart is empty.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty";

/// Source of the per-product add-to-cart cooldown state.
pub trait Cooldown {
    /// Time left before the add button for `id` re-enables, or `None` when
    /// it is not cooling down.
    fn remaining(&self, id: ProductId) -> Option<Duration>;

    /// Whether the add button for `id` is currently cooling down.
    fn is_cooling(&self, id: ProductId) -> bool {
        self.remaining(id).is_some()
    }
}

/// A cooldown source where nothing is ever cooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCooldown;

impl Cooldown for NoCooldown {
    fn remaining(&self, _id: ProductId) -> Option<Duration> {
        None
    }
}

impl<F: Fn(ProductId) -> Option<Duration>> Cooldown for F {
    fn remaining(&self, id: ProductId) -> Option<Duration> {
        self(id)
    }
}

/// One product card in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCardView {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub category: String,
    pub description: String,
    pub image_url: String,
    /// `Add to Cart`, or `Added (N)` once the product is in the cart.
    pub button_label: String,
    pub in_cart: bool,
    /// The add button is cooling down after a click.
    pub disabled: bool,
    /// Milliseconds until a disabled button re-enables, rounded up.
    pub cooldown_ms: u128,
}

/// One line of the cart panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub id: ProductId,
    pub name: String,
    pub image_url: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_price: String,
}

/// The cart panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartPanelView {
    pub lines: Vec<CartLineView>,
}

impl CartPanelView {
    /// Whether the panel should show [`EMPTY_CART_MESSAGE`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The empty-cart message.
    #[must_use]
    pub const fn empty_message(&self) -> &'static str {
        EMPTY_CART_MESSAGE
    }
}

/// The cart count badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartBadgeView {
    pub count: u32,
    /// Highlight the badge (count above zero).
    pub active: bool,
}

/// Every region of the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontView {
    pub products: Vec<ProductCardView>,
    pub cart: CartPanelView,
    pub badge: CartBadgeView,
    pub subtotal: String,
}

/// Project `products` and `cart` into the full widget view.
#[must_use]
pub fn render<S>(
    products: &[&Product],
    cart: &CartStore<S>,
    cooldown: &impl Cooldown,
    currency: CurrencyCode,
) -> StorefrontView {
    StorefrontView {
        products: product_grid(products, cart, cooldown, currency),
        cart: cart_panel(cart, currency),
        badge: badge(cart),
        subtotal: subtotal(cart, currency),
    }
}

/// Cards for `products`, in the given order.
#[must_use]
pub fn product_grid<S>(
    products: &[&Product],
    cart: &CartStore<S>,
    cooldown: &impl Cooldown,
    currency: CurrencyCode,
) -> Vec<ProductCardView> {
    products
        .iter()
        .map(|product| product_card(product, cart, cooldown, currency))
        .collect()
}

/// A single product card.
#[must_use]
pub fn product_card<S>(
    product: &Product,
    cart: &CartStore<S>,
    cooldown: &impl Cooldown,
    currency: CurrencyCode,
) -> ProductCardView {
    let line = cart.line(product.product_id);
    let remaining = cooldown.remaining(product.product_id);

    ProductCardView {
        id: product.product_id,
        name: product.name.clone(),
        price: product.unit_price(currency).display(),
        category: product.category.clone(),
        description: product.description.clone(),
        image_url: product.image_url.clone(),
        button_label: button_label(line),
        in_cart: line.is_some(),
        disabled: remaining.is_some(),
        cooldown_ms: remaining.map_or(0, |left| left.as_micros().div_ceil(1000)),
    }
}

/// The cart panel lines.
#[must_use]
pub fn cart_panel<S>(cart: &CartStore<S>, currency: CurrencyCode) -> CartPanelView {
    CartPanelView {
        lines: cart
            .lines()
            .iter()
            .map(|line| CartLineView {
                id: line.product_id(),
                name: line.product.name.clone(),
                image_url: line.product.image_url.clone(),
                quantity: line.quantity,
                unit_price: line.product.unit_price(currency).display(),
                line_price: Price::new(line.subtotal(), currency).display(),
            })
            .collect(),
    }
}

/// The cart count badge.
#[must_use]
pub fn badge<S>(cart: &CartStore<S>) -> CartBadgeView {
    let count = cart.item_count();
    CartBadgeView {
        count,
        active: count > 0,
    }
}

/// The formatted cart subtotal.
#[must_use]
pub fn subtotal<S>(cart: &CartStore<S>, currency: CurrencyCode) -> String {
    cart.total(currency).display()
}

fn button_label(line: Option<&CartLine>) -> String {
    line.map_or_else(
        || ADD_TO_CART_LABEL.to_string(),
        |line| format!("Added ({})", line.quantity),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::CatalogStore;
    use crate::catalog::tests::product;
    use crate::storage::MemoryStore;

    fn setup() -> (CatalogStore, CartStore<MemoryStore>) {
        let catalog = CatalogStore::from_products(vec![
            product(1, Decimal::new(1000, 2), "Snacks"),
            product(2, Decimal::new(550, 2), "Beverages"),
        ]);
        let cart = CartStore::load(MemoryStore::new());
        (catalog, cart)
    }

    #[test]
    fn test_empty_cart_view() {
        let (catalog, cart) = setup();
        let products: Vec<&Product> = catalog.products().iter().collect();

        let view = render(&products, &cart, &NoCooldown, CurrencyCode::INR);

        assert_eq!(view.products.len(), 2);
        assert!(view.products.iter().all(|p| p.button_label == ADD_TO_CART_LABEL));
        assert!(view.cart.is_empty());
        assert_eq!(view.cart.empty_message(), "Your cart is empty");
        assert_eq!(view.badge, CartBadgeView { count: 0, active: false });
        assert_eq!(view.subtotal, "₹0.00");
    }

    #[test]
    fn test_added_label_and_totals() {
        let (catalog, mut cart) = setup();
        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();
        cart.add_or_increment(&catalog, ProductId::new(1)).unwrap();
        cart.add_or_increment(&catalog, ProductId::new(2)).unwrap();
        let products: Vec<&Product> = catalog.products().iter().collect();

        let view = render(&products, &cart, &NoCooldown, CurrencyCode::INR);

        let first = view.products.first().unwrap();
        assert_eq!(first.button_label, "Added (2)");
        assert!(first.in_cart);
        assert_eq!(first.price, "₹10.00");

        let line = view.cart.lines.first().unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.line_price, "₹20.00");

        assert_eq!(view.badge, CartBadgeView { count: 3, active: true });
        assert_eq!(view.subtotal, "₹25.50");
    }

    #[test]
    fn test_cooldown_disables_button() {
        let (catalog, cart) = setup();
        let products: Vec<&Product> = catalog.products().iter().collect();
        let cooling = |id: ProductId| {
            (id == ProductId::new(2)).then(|| Duration::from_micros(250_400))
        };

        let view = render(&products, &cart, &cooling, CurrencyCode::INR);

        let disabled: Vec<(bool, u128)> = view
            .products
            .iter()
            .map(|p| (p.disabled, p.cooldown_ms))
            .collect();
        assert_eq!(disabled, vec![(false, 0), (true, 251)]);
    }

    #[test]
    fn test_grid_follows_given_order() {
        let (catalog, cart) = setup();
        let products: Vec<&Product> = catalog.products().iter().rev().collect();

        let grid = product_grid(&products, &cart, &NoCooldown, CurrencyCode::USD);

        let ids: Vec<i64> = grid.iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(grid.first().unwrap().price, "$5.50");
    }
}
