//! Integration tests for Tidewater.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tidewater-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_flow`, `consent`, `checkout` - the full router driven in-process
//!   against the in-memory commerce backend
//! - `commerce_client`, `fetch_proxy` - the HTTP client and transport against
//!   a `wiremock` server
//!
//! Nothing here needs a running backend or network access beyond loopback.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
    middleware,
};
use secrecy::SecretString;
use serde_json::Value;
use tidewater_storefront::config::{CacheConfig, CommerceConfig, StorefrontConfig};
use tidewater_storefront::middleware::request_id_middleware;
use tidewater_storefront::routes;
use tidewater_storefront::state::AppState;
use tidewater_storefront::testing::FakeBackend;
use tower::ServiceExt;
use url::Url;

/// Configuration pointing at `backend_url`, served over plain HTTP.
#[must_use]
pub fn test_config(backend_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:8000".to_string(),
        commerce: commerce_config(backend_url),
        cache: CacheConfig::default(),
        identity_timeout: Duration::from_secs(3),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Commerce client configuration for `backend_url`.
#[must_use]
pub fn commerce_config(backend_url: &str) -> CommerceConfig {
    CommerceConfig {
        backend_url: Url::parse(backend_url).unwrap(),
        publishable_key: SecretString::from("pk_01HTIDEWATERTEST"),
        request_timeout: Duration::from_secs(2),
        relay: None,
    }
}

/// A response with its body decoded.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    pub json: Value,
}

impl TestResponse {
    /// Every `Set-Cookie` header value.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_owned)
            .collect()
    }

    /// The `Set-Cookie` header for `name`, if present.
    #[must_use]
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.set_cookies()
            .into_iter()
            .find(|cookie| cookie.starts_with(&prefix))
    }
}

/// The storefront router over an in-memory backend.
pub struct TestApp {
    pub backend: Arc<FakeBackend>,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// A fresh app over a fresh backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config("http://commerce.invalid"))
    }

    /// A fresh app with custom configuration.
    #[must_use]
    pub fn with_config(config: StorefrontConfig) -> Self {
        let backend = Arc::new(FakeBackend::new());
        let state = AppState::new(config, backend.clone());
        let router = routes::routes()
            .with_state(state)
            .layer(middleware::from_fn(request_id_middleware));
        Self { backend, router }
    }

    /// Send a request with the given cookies and optional JSON body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        cookies: &[(&str, &str)],
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if !cookies.is_empty() {
            let cookie_header = cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie_header);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            text,
            json,
        }
    }

    /// `GET` with cookies.
    pub async fn get(&self, uri: &str, cookies: &[(&str, &str)]) -> TestResponse {
        self.call(Method::GET, uri, cookies, None).await
    }
}
