//! Catalog fetch against a stub endpoint.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use kirana_integration_tests::{SAMPLE_CATALOG, TestContext, serve_catalog};
use kirana_storefront::catalog::{HttpCatalog, load_catalog};

#[tokio::test]
async fn test_page_shows_loading_until_catalog_arrives() {
    let ctx = TestContext::without_catalog(Duration::from_secs(1));

    let resp = ctx.get("/").await;
    assert!(resp.text().contains("Loading products..."));
    assert_eq!(
        ctx.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );

    let url = serve_catalog(StatusCode::OK, SAMPLE_CATALOG).await;
    load_catalog(&ctx.state, &HttpCatalog::new(url)).await;

    assert_eq!(ctx.get("/health/ready").await.status, StatusCode::OK);
    let body = ctx.get("/").await.text();
    assert!(body.contains("Samosa"));
    assert!(!body.contains("Loading products..."));
    assert!(body.contains("Beverages"));
}

#[tokio::test]
async fn test_failed_fetch_shows_error() {
    let ctx = TestContext::without_catalog(Duration::from_secs(1));

    let url = serve_catalog(StatusCode::INTERNAL_SERVER_ERROR, "oops").await;
    load_catalog(&ctx.state, &HttpCatalog::new(url)).await;

    let body = ctx.get("/").await.text();
    assert!(body.contains("Could not load products"));
    assert!(!body.contains("Loading products..."));
    assert_eq!(
        ctx.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_malformed_catalog_shows_error() {
    let ctx = TestContext::without_catalog(Duration::from_secs(1));

    let url = serve_catalog(StatusCode::OK, r#"{"products": []}"#).await;
    load_catalog(&ctx.state, &HttpCatalog::new(url)).await;

    assert!(ctx.get("/").await.text().contains("Could not load products"));
}
