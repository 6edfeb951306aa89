//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Mutations answer with every widget region so the grid buttons, cart
//! panel, badge and subtotal never disagree.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
};
use kirana_core::ProductId;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{CategoryQuery, RegionsTemplate, redraw};
use crate::error::{Result, add_breadcrumb};
use crate::state::{AppState, WidgetSnapshot};

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub category: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub delta: i64,
    pub category: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
    pub category: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub widget: WidgetSnapshot,
    pub oob: bool,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub widget: WidgetSnapshot,
    pub oob: bool,
}

/// Display the cart panel.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<CartItemsTemplate> {
    Ok(CartItemsTemplate {
        widget: state.snapshot(&query.filter())?,
        oob: false,
    })
}

/// Get cart count badge (HTMX).
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Result<CartCountTemplate> {
    Ok(CartCountTemplate {
        widget: state.snapshot(&CategoryQuery::default().filter())?,
        oob: false,
    })
}

/// Add item to cart (HTMX).
///
/// Clicks on a product whose button is cooling down are ignored.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Form(form): Form<AddToCartForm>,
) -> Result<RegionsTemplate> {
    let id = form.product_id;
    let filter = CategoryQuery {
        category: form.category,
    }
    .filter();

    if !state.cooldowns().try_start(id) {
        debug!(product_id = %id, "Add ignored during cooldown");
        return redraw(&state, &filter, "");
    }

    let quantity = state
        .with_stores(|catalog, cart| Ok(cart.add_or_increment(catalog, id)?))
        .inspect_err(|_| {
            state.cooldowns().cancel(id);
        })?;
    match quantity {
        Some(quantity) => {
            let product_id = id.to_string();
            add_breadcrumb("cart", "Added product", Some(&[("product_id", product_id.as_str())]));
            info!(product_id = %id, quantity, "Added to cart");
        }
        None => {
            state.cooldowns().cancel(id);
            debug!(product_id = %id, "Add ignored for unknown product");
        }
    }

    redraw(&state, &filter, "")
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Form(form): Form<UpdateCartForm>,
) -> Result<RegionsTemplate> {
    let id = form.product_id;
    let filter = CategoryQuery {
        category: form.category,
    }
    .filter();

    let quantity = state.with_stores(|_, cart| Ok(cart.change_quantity(id, form.delta)?))?;
    match quantity {
        Some(quantity) => info!(product_id = %id, quantity, "Cart quantity changed"),
        None => info!(product_id = %id, "Cart line removed or absent"),
    }

    redraw(&state, &filter, "")
}

/// Remove item from cart (HTMX).
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<RegionsTemplate> {
    let id = form.product_id;
    let filter = CategoryQuery {
        category: form.category,
    }
    .filter();

    if state.with_stores(|_, cart| Ok(cart.remove(id)?))? {
        let product_id = id.to_string();
        add_breadcrumb("cart", "Removed product", Some(&[("product_id", product_id.as_str())]));
        info!(product_id = %id, "Cart line removed");
    }

    redraw(&state, &filter, "")
}
