//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Storefront page (grid, cart panel, checkout form)
//!
//! # Products (HTMX fragments)
//! GET  /products?category=        - Product grid for a category
//! GET  /products/{id}/button      - Add button for one card (cooldown refresh)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                      - Cart panel lines
//! GET  /cart/count                - Cart count badge
//! POST /cart/add                  - Add or increment (redraws every region)
//! POST /cart/update               - Change quantity by a delta (redraws every region)
//! POST /cart/remove               - Remove a line (redraws every region)
//!
//! # Checkout
//! POST /checkout                  - Run checkout (redraws every region, triggers download)
//! GET  /receipts/{token}          - Download a generated receipt once
//! ```
//!
//! Every cart mutation answers with all widget regions as out-of-band swaps,
//! so the page is always a fresh projection of the stores.

pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    routing::{get, post},
};
use kirana_core::CategoryFilter;
use serde::Deserialize;

use crate::error::Result;
use crate::state::{AppState, WidgetSnapshot};

/// Category carried by links and hidden form fields.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

impl CategoryQuery {
    /// The filter this query selects.
    #[must_use]
    pub fn filter(&self) -> CategoryFilter {
        CategoryFilter::from_optional(self.category.as_deref())
    }
}

/// Every widget region, marked for out-of-band swapping.
#[derive(Template, WebTemplate)]
#[template(path = "partials/regions.html")]
pub struct RegionsTemplate {
    pub widget: WidgetSnapshot,
    pub notice: String,
    pub oob: bool,
}

/// Re-project the stores into every region.
pub(crate) fn redraw(
    state: &AppState,
    filter: &CategoryFilter,
    notice: impl Into<String>,
) -> Result<RegionsTemplate> {
    Ok(RegionsTemplate {
        widget: state.snapshot(filter)?,
        notice: notice.into(),
        oob: true,
    })
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}/button", get(products::button))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Storefront page
        .route("/", get(home::index))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout and receipt download
        .route("/checkout", post(checkout::checkout))
        .route("/receipts/{token}", get(checkout::receipt))
}
