//! Outbound HTTP transport.
//!
//! Every backend call goes through [`HttpTransport::send`]. The transport
//! owns the generic timeout (set on the `reqwest` client) and, while a
//! [`ProxyPolicy`] is installed, rewrites request targets and retries a
//! transiently failed request once through a relay. Response bodies and
//! status codes are passed through untouched.

mod proxy;

pub use proxy::{ProxyActivation, ProxyError, ProxyPolicy, RewriteMode, RewriteRule};

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};
use url::Url;

use proxy::PolicySlot;

/// A request description that can be dispatched more than once.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl OutboundRequest {
    /// A request with no headers and no body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP transport with an installable fetch proxy.
///
/// Cheap to clone; clones share the underlying connection pool and the
/// proxy slot.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    slot: PolicySlot,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            slot: Arc::new(ArcSwapOption::empty()),
        })
    }

    /// Install a proxy policy for the lifetime of the returned activation.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::AlreadyActive`] if a policy is already installed.
    pub fn install(&self, policy: ProxyPolicy) -> Result<ProxyActivation, ProxyError> {
        proxy::install(&self.slot, policy)
    }

    /// Whether a proxy policy is currently installed.
    #[must_use]
    pub fn is_proxy_active(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Send a request, applying the active proxy policy if there is one.
    ///
    /// # Errors
    ///
    /// Returns the transport error of the last attempt. Non-2xx responses
    /// are not errors at this level.
    pub async fn send(&self, request: &OutboundRequest) -> Result<reqwest::Response, reqwest::Error> {
        let Some(policy) = self.slot.load_full() else {
            return self.dispatch(request, request.url.clone()).await;
        };

        let target = policy.rewrite(&request.url);
        if target != request.url {
            debug!(from = %request.url, to = %target, "rewriting outbound request");
        }

        match self.dispatch(request, target).await {
            Err(err) if is_transient(&err, &request.method) => {
                let Some(relay) = policy.fallback(&request.url) else {
                    return Err(err);
                };
                warn!(
                    error = %err,
                    url = %request.url,
                    relay = %relay,
                    "transient failure, retrying once through relay"
                );
                self.dispatch(request, relay).await
            }
            other => other,
        }
    }

    async fn dispatch(
        &self,
        request: &OutboundRequest,
        url: Url,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder.send().await
    }
}

/// Failures worth one retry through a relay.
///
/// A connect failure never reached the backend, so any method may be
/// retried. A timeout may have reached it, so only idempotent methods are
/// retried to avoid duplicate cart creation.
fn is_transient(err: &reqwest::Error, method: &Method) -> bool {
    err.is_connect() || (err.is_timeout() && method.is_idempotent())
}
