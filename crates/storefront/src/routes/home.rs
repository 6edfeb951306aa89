//! Storefront page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use tracing::instrument;

use super::CategoryQuery;
use crate::error::Result;
use crate::state::{AppState, WidgetSnapshot};

/// Full storefront page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub widget: WidgetSnapshot,
    pub notice: String,
    pub oob: bool,
}

/// Display the storefront page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<IndexTemplate> {
    Ok(IndexTemplate {
        widget: state.snapshot(&query.filter())?,
        notice: String::new(),
        oob: false,
    })
}
