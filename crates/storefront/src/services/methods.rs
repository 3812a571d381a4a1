//! Short-TTL cache over shipping options and payment providers.

use std::sync::Arc;
use std::time::Duration;

use tidewater_core::{CartId, PaymentMethods, PaymentScope, RegionId, ShippingOption};
use tracing::instrument;

use crate::cache::TtlCache;
use crate::commerce::{CommerceBackend, CommerceError};

/// Cached shipping and payment method lookups for checkout.
#[derive(Clone)]
pub struct MethodCache {
    backend: Arc<dyn CommerceBackend>,
    shipping: TtlCache<CartId, Vec<ShippingOption>>,
    payment: TtlCache<RegionId, PaymentMethods>,
}

impl MethodCache {
    /// Create a method cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(backend: Arc<dyn CommerceBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            shipping: TtlCache::new(ttl),
            payment: TtlCache::new(ttl),
        }
    }

    /// Shipping options for a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend lookup fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn shipping_methods(&self, cart_id: &CartId) -> Result<Vec<ShippingOption>, CommerceError> {
        let options = self
            .shipping
            .get_or_try_compute::<_, _, CommerceError>(cart_id.clone(), || async {
                Ok(Some(self.backend.list_shipping_options(cart_id).await?))
            })
            .await?;
        Ok(options.unwrap_or_default())
    }

    /// Payment providers for a region.
    ///
    /// When the region has none registered, the unfiltered list is queried
    /// once instead, since some backends register providers above region
    /// level. The result records which query answered.
    ///
    /// # Errors
    ///
    /// Returns an error if either backend lookup fails.
    #[instrument(skip(self), fields(region_id = %region_id))]
    pub async fn payment_methods(&self, region_id: &RegionId) -> Result<PaymentMethods, CommerceError> {
        let methods = self
            .payment
            .get_or_try_compute::<_, _, CommerceError>(region_id.clone(), || async {
                let scoped = self.backend.list_payment_providers(Some(region_id)).await?;
                if !scoped.is_empty() {
                    return Ok(Some(PaymentMethods {
                        providers: scoped,
                        scope: PaymentScope::Region,
                    }));
                }

                let providers = self.backend.list_payment_providers(None).await?;
                tracing::debug!(
                    providers = providers.len(),
                    "no region-scoped payment providers, used unscoped list"
                );
                Ok(Some(PaymentMethods {
                    providers,
                    scope: PaymentScope::Unscoped,
                }))
            })
            .await?;

        Ok(methods.unwrap_or(PaymentMethods {
            providers: Vec::new(),
            scope: PaymentScope::Unscoped,
        }))
    }
}
