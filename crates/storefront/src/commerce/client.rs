//! HTTP implementation of [`CommerceBackend`].
//!
//! Requests carry the publishable API key and go through the shared
//! [`HttpTransport`], which owns timeouts and the fetch proxy.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tidewater_core::{
    Cart, CartId, CartUpdate, Customer, PaymentProvider, Region, RegionId, ShippingOption,
    VariantId, VariantPrice,
};
use tracing::instrument;
use url::Url;

use super::wire::{
    CartResponse, CustomerResponse, PaymentProvidersResponse, RegionsResponse,
    ShippingOptionsResponse, VariantsResponse,
};
use super::{CommerceBackend, CommerceError};
use crate::config::CommerceConfig;
use crate::transport::{HttpTransport, OutboundRequest};

const PUBLISHABLE_KEY_HEADER: HeaderName = HeaderName::from_static("x-publishable-api-key");

/// Client for the commerce backend's store API.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    transport: HttpTransport,
    base_url: Url,
    publishable_key: HeaderValue,
}

impl CommerceClient {
    /// Create a client with its own transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or the publishable
    /// key cannot be sent as a header.
    pub fn new(config: &CommerceConfig) -> Result<Self, CommerceError> {
        let transport = HttpTransport::new(config.request_timeout)?;
        Self::with_transport(config, transport)
    }

    /// Create a client on top of an existing transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the publishable key cannot be sent as a header.
    pub fn with_transport(
        config: &CommerceConfig,
        transport: HttpTransport,
    ) -> Result<Self, CommerceError> {
        let mut publishable_key = HeaderValue::from_str(config.publishable_key.expose_secret())
            .map_err(|_| CommerceError::InvalidRequest("publishable key is not a valid header".to_string()))?;
        publishable_key.set_sensitive(true);

        // Joining relative segments needs a trailing slash on the base path.
        let mut base_url = config.backend_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                transport,
                base_url,
                publishable_key,
            }),
        })
    }

    /// The transport used for every request.
    #[must_use]
    pub fn transport(&self) -> &HttpTransport {
        &self.inner.transport
    }

    /// Build an endpoint URL from path segments and query pairs.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, CommerceError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CommerceError::InvalidRequest("backend URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> OutboundRequest {
        OutboundRequest::new(method, url)
            .header(PUBLISHABLE_KEY_HEADER, self.inner.publishable_key.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
    }

    /// Send a request and decode a JSON response.
    async fn execute<T: DeserializeOwned>(&self, request: OutboundRequest) -> Result<T, CommerceError> {
        let path = request.url.path().to_string();
        let response = self.inner.transport.send(&request).await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CommerceError::NotFound(path));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %response_text.chars().take(500).collect::<String>(),
                "Commerce backend returned non-success status"
            );
            return Err(CommerceError::Status {
                status: status.as_u16(),
                message: response_text.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse commerce backend response"
            );
            CommerceError::Parse(e)
        })
    }
}

#[async_trait]
impl CommerceBackend for CommerceClient {
    #[instrument(skip(self))]
    async fn list_regions(&self) -> Result<Vec<Region>, CommerceError> {
        let url = self.endpoint(&["store", "regions"], &[])?;
        let data: RegionsResponse = self.execute(self.request(Method::GET, url)).await?;
        Ok(data.regions.into_iter().map(Region::from).collect())
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn retrieve_cart(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
        let url = self.endpoint(&["store", "carts", cart_id.as_str()], &[])?;
        let data: CartResponse = self.execute(self.request(Method::GET, url)).await?;
        Ok(data.cart)
    }

    #[instrument(skip(self), fields(region_id = %region_id))]
    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, CommerceError> {
        let url = self.endpoint(&["store", "carts"], &[])?;
        let request = self
            .request(Method::POST, url)
            .json(serde_json::json!({ "region_id": region_id }));
        let data: CartResponse = self.execute(request).await?;
        Ok(data.cart)
    }

    #[instrument(skip(self, update), fields(cart_id = %cart_id))]
    async fn update_cart(&self, cart_id: &CartId, update: &CartUpdate) -> Result<Cart, CommerceError> {
        let url = self.endpoint(&["store", "carts", cart_id.as_str()], &[])?;
        let request = self
            .request(Method::POST, url)
            .json(serde_json::to_value(update)?);
        let data: CartResponse = self.execute(request).await?;
        Ok(data.cart)
    }

    #[instrument(skip(self, variant_ids), fields(region_id = %region_id, variants = variant_ids.len()))]
    async fn variant_prices(
        &self,
        region_id: &RegionId,
        variant_ids: &[VariantId],
    ) -> Result<Vec<VariantPrice>, CommerceError> {
        if variant_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = vec![("region_id", region_id.as_str())];
        query.extend(variant_ids.iter().map(|id| ("id", id.as_str())));

        let url = self.endpoint(&["store", "variants"], &query)?;
        let data: VariantsResponse = self.execute(self.request(Method::GET, url)).await?;
        Ok(data
            .variants
            .into_iter()
            .filter_map(|variant| variant.into_price(region_id))
            .collect())
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn list_shipping_options(&self, cart_id: &CartId) -> Result<Vec<ShippingOption>, CommerceError> {
        let url = self.endpoint(&["store", "shipping-options"], &[("cart_id", cart_id.as_str())])?;
        let data: ShippingOptionsResponse = self.execute(self.request(Method::GET, url)).await?;
        Ok(data
            .shipping_options
            .into_iter()
            .map(ShippingOption::from)
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_payment_providers(
        &self,
        region_id: Option<&RegionId>,
    ) -> Result<Vec<PaymentProvider>, CommerceError> {
        let query: Vec<(&str, &str)> = region_id
            .map(|id| vec![("region_id", id.as_str())])
            .unwrap_or_default();
        let url = self.endpoint(&["store", "payment-providers"], &query)?;
        let data: PaymentProvidersResponse = self.execute(self.request(Method::GET, url)).await?;
        Ok(data.payment_providers)
    }

    #[instrument(skip(self, token))]
    async fn retrieve_customer(&self, token: &SecretString) -> Result<Customer, CommerceError> {
        let url = self.endpoint(&["store", "customers", "me"], &[])?;
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| CommerceError::InvalidRequest("customer token is not a valid header".to_string()))?;
        bearer.set_sensitive(true);

        let request = self.request(Method::GET, url).header(AUTHORIZATION, bearer);
        let data: CustomerResponse = self.execute(request).await?;
        Ok(data.customer)
    }
}
