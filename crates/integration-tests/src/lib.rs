//! Integration tests for the Kirana storefront.
//!
//! The storefront router is driven in-process with
//! [`tower::ServiceExt::oneshot`]; no server or network is needed except
//! for the catalog tests, which start a stub catalog endpoint on a local
//! ephemeral port.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kirana-integration-tests
//! ```

use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use kirana_core::{KeyValueStore, MemoryStore, Product};
use kirana_storefront::config::StorefrontConfig;
use kirana_storefront::state::AppState;
use tower::ServiceExt;

/// The catalog every test starts from.
pub const SAMPLE_CATALOG: &str = r#"[
    {"product_id": 1, "name": "Masala Chai", "price": 10, "category": "Beverages", "description": "Spiced tea", "image_url": "https://example.com/chai.jpg"},
    {"product_id": 2, "name": "Samosa", "price": 15.5, "category": "Snacks", "description": "Potato filling", "image_url": ""},
    {"product_id": 3, "name": "Lassi", "price": "25.00", "category": "Beverages"}
]"#;

/// A captured response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Body as UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// A header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value sent for a header, in order.
    #[must_use]
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// The re-enable delay rendered on a product's disabled add button.
    ///
    /// `None` when the button is enabled or absent from the body.
    #[must_use]
    pub fn reenable_delay_ms(&self, product_id: i64) -> Option<u64> {
        let body = self.text();
        let start = body.find(&format!(r#"id="add-to-cart-{product_id}""#))?;
        let button = body.get(start..)?;
        let button = button.get(..button.find('>')?)?;
        let delay = button.get(button.find("load delay:")? + "load delay:".len()..)?;
        let digits: String = delay.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

/// A storefront wired to in-memory storage.
pub struct TestContext {
    pub state: AppState,
    pub store: MemoryStore,
    router: Router,
}

impl TestContext {
    /// Storefront with [`SAMPLE_CATALOG`] loaded and the given add cooldown.
    #[must_use]
    pub fn with_cooldown(cooldown: Duration) -> Self {
        let ctx = Self::without_catalog(cooldown);
        ctx.state.replace_catalog(sample_products());
        ctx
    }

    /// Storefront with [`SAMPLE_CATALOG`] loaded and a long add cooldown.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cooldown(Duration::from_secs(60))
    }

    /// Storefront whose catalog has not been loaded.
    #[must_use]
    pub fn without_catalog(cooldown: Duration) -> Self {
        let store = MemoryStore::new();
        let config = StorefrontConfig {
            add_cooldown: cooldown,
            ..StorefrontConfig::default()
        };
        let state = AppState::new(config, Box::new(store.clone()));
        let router = kirana_storefront::app(state.clone());
        Self {
            state,
            store,
            router,
        }
    }

    /// Send a GET request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::get(uri)
            .body(Body::empty())
            .unwrap_or_else(|e| panic!("invalid request {uri}: {e}"));
        self.send(request).await
    }

    /// Send a form POST request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn post_form(&self, uri: &str, form: &str) -> TestResponse {
        let request = Request::post(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .header("hx-request", "true")
            .body(Body::from(form.to_string()))
            .unwrap_or_else(|e| panic!("invalid request {uri}: {e}"));
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("failed to read body: {e}"));
        TestResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }

    /// The raw persisted cart, if any was written.
    ///
    /// # Panics
    ///
    /// Panics if the store cannot be read.
    #[must_use]
    pub fn persisted_cart(&self) -> Option<serde_json::Value> {
        self.store
            .get(kirana_core::CART_STORAGE_KEY)
            .unwrap_or_else(|e| panic!("store read failed: {e}"))
            .map(|raw| {
                serde_json::from_str(&raw).unwrap_or_else(|e| panic!("invalid cart json: {e}"))
            })
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Products parsed from [`SAMPLE_CATALOG`].
///
/// # Panics
///
/// Panics if the sample catalog is not valid.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    serde_json::from_str(SAMPLE_CATALOG).unwrap_or_else(|e| panic!("invalid sample catalog: {e}"))
}

/// Serve `body` with `status` at `/catalog` on an ephemeral local port.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn serve_catalog(status: StatusCode, body: &'static str) -> url::Url {
    let app = Router::new().route(
        "/catalog",
        axum::routing::get(move || async move { (status, body) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("failed to bind stub catalog: {e}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("no local address: {e}"));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    url::Url::parse(&format!("http://{addr}/catalog"))
        .unwrap_or_else(|e| panic!("invalid stub url: {e}"))
}
