//! Commerce backend access.
//!
//! # Architecture
//!
//! - [`CommerceBackend`] is the seam every service talks to, so services can
//!   be exercised against an in-memory backend in tests
//! - [`CommerceClient`] is the production implementation, speaking the
//!   backend's JSON REST API through the [`HttpTransport`](crate::transport::HttpTransport)
//! - The backend is the source of truth for carts; nothing is stored locally
//!
//! # Example
//!
//! ```rust,ignore
//! use tidewater_storefront::commerce::{CommerceBackend, CommerceClient};
//!
//! let client = CommerceClient::new(&config.commerce)?;
//! let regions = client.list_regions().await?;
//! let cart = client.create_cart(&regions[0].id).await?;
//! ```

mod client;
mod wire;

pub use client::CommerceClient;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use tidewater_core::{
    Cart, CartId, CartUpdate, Customer, PaymentProvider, Region, RegionId, ShippingOption,
    VariantId, VariantPrice,
};

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed at the transport level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A request could not be built (bad base URL, unencodable header).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CommerceError {
    /// Whether the backend reported the resource as absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Operations the orchestration layer needs from the commerce backend.
#[async_trait]
pub trait CommerceBackend: Send + Sync {
    /// All regions with their countries.
    async fn list_regions(&self) -> Result<Vec<Region>, CommerceError>;

    /// Retrieve a cart by id.
    async fn retrieve_cart(&self, cart_id: &CartId) -> Result<Cart, CommerceError>;

    /// Create an empty cart bound to `region_id`.
    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, CommerceError>;

    /// Apply an allow-listed update.
    async fn update_cart(&self, cart_id: &CartId, update: &CartUpdate) -> Result<Cart, CommerceError>;

    /// Current prices for `variant_ids` in `region_id`. Variants without a
    /// price in that region are omitted.
    async fn variant_prices(
        &self,
        region_id: &RegionId,
        variant_ids: &[VariantId],
    ) -> Result<Vec<VariantPrice>, CommerceError>;

    /// Shipping options available for a cart.
    async fn list_shipping_options(&self, cart_id: &CartId) -> Result<Vec<ShippingOption>, CommerceError>;

    /// Payment providers, optionally filtered to one region.
    async fn list_payment_providers(
        &self,
        region_id: Option<&RegionId>,
    ) -> Result<Vec<PaymentProvider>, CommerceError>;

    /// The customer that `token` authenticates.
    async fn retrieve_customer(&self, token: &SecretString) -> Result<Customer, CommerceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commerce_error_display() {
        let err = CommerceError::NotFound("cart cart_123".to_string());
        assert_eq!(err.to_string(), "Not found: cart cart_123");
        assert!(err.is_not_found());

        let err = CommerceError::Status {
            status: 502,
            message: "upstream".to_string(),
        };
        assert_eq!(err.to_string(), "Backend returned 502: upstream");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_rate_limited_error() {
        let err = CommerceError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
