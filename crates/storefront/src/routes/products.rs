//! Product grid route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use kirana_core::ProductId;
use kirana_core::render::ProductCardView;
use tracing::instrument;

use super::CategoryQuery;
use crate::error::Result;
use crate::state::{AppState, WidgetSnapshot};

/// Product grid fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub widget: WidgetSnapshot,
    pub oob: bool,
}

/// Single add button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/add_button.html")]
pub struct AddButtonTemplate {
    pub product: ProductCardView,
}

/// Display the product grid for a category.
///
/// While the catalog is still loading the fragment polls itself.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<ProductGridTemplate> {
    Ok(ProductGridTemplate {
        widget: state.snapshot(&query.filter())?,
        oob: false,
    })
}

/// Re-render one add button.
///
/// Disabled buttons request this once their cooldown is due to re-enable themselves.
#[instrument(skip(state))]
pub async fn button(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<AddButtonTemplate> {
    Ok(AddButtonTemplate {
        product: state.product_card(id)?,
    })
}
