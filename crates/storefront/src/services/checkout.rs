//! Checkout composition.
//!
//! Region and cart first, sequentially. Then pricing and identity together,
//! then shipping and payment together.

use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;
use tidewater_core::{
    Cart, CountryCode, Customer, EnrichedLineItem, PaymentMethods, Region, ShippingOption,
};
use tracing::instrument;

use super::cart::{CartError, CartService};
use super::identity::IdentityResolver;
use super::methods::MethodCache;
use crate::commerce::CommerceError;
use crate::middleware::{ConsentGate, SessionCookieStore};

/// Errors composing a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Shipping or payment lookup failed.
    #[error("method lookup failed: {0}")]
    Methods(#[from] CommerceError),
}

/// Everything the checkout page renders from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub region: Region,
    pub cart: Cart,
    pub items: Vec<EnrichedLineItem>,
    pub customer: Option<Customer>,
    pub shipping_options: Vec<ShippingOption>,
    pub payment: PaymentMethods,
    pub cookie_consent_required: bool,
}

/// Composes the checkout view from the other services.
#[derive(Clone)]
pub struct CheckoutService {
    carts: CartService,
    methods: MethodCache,
    identity: IdentityResolver,
}

impl CheckoutService {
    #[must_use]
    pub const fn new(carts: CartService, methods: MethodCache, identity: IdentityResolver) -> Self {
        Self {
            carts,
            methods,
            identity,
        }
    }

    /// Build the checkout view for `country`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Cart`] if the region or cart cannot be
    /// obtained, or [`CheckoutError::Methods`] if shipping or payment lookup
    /// fails. Identity and pricing failures degrade instead of erroring.
    #[instrument(skip_all, fields(country = %country))]
    pub async fn compose(
        &self,
        country: &CountryCode,
        session: &mut SessionCookieStore,
        consent: &ConsentGate,
        token: Option<SecretString>,
    ) -> Result<CheckoutView, CheckoutError> {
        let outcome = self.carts.get_or_create(country, session, consent).await?;
        let cart = outcome.cart;
        let region = outcome.region;

        let (items, customer) = tokio::join!(
            self.carts.enrich(&cart.items, &region.id),
            self.identity.customer(token),
        );

        let (shipping_options, payment) = tokio::join!(
            self.methods.shipping_methods(&cart.id),
            self.methods.payment_methods(&region.id),
        );

        Ok(CheckoutView {
            items,
            customer,
            shipping_options: shipping_options?,
            payment: payment?,
            cookie_consent_required: outcome.cookie_consent_required,
            region,
            cart,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tidewater_core::{ConsentDecision, PaymentScope, RegionId};

    use super::*;
    use crate::services::RegionResolver;
    use crate::testing::FakeBackend;

    fn checkout(backend: &Arc<FakeBackend>) -> CheckoutService {
        let regions = RegionResolver::new(backend.clone(), Duration::from_secs(300));
        CheckoutService::new(
            CartService::new(backend.clone(), regions),
            MethodCache::new(backend.clone(), Duration::from_secs(30)),
            IdentityResolver::new(backend.clone(), Duration::from_secs(3)),
        )
    }

    #[tokio::test]
    async fn test_composes_guest_checkout() {
        let backend = Arc::new(FakeBackend::new());
        backend.set_payment_providers(None, &["pp_card"]);
        let mut session = SessionCookieStore::new(None, false);

        let view = checkout(&backend)
            .compose(
                &CountryCode::parse("gb").unwrap(),
                &mut session,
                &ConsentGate::new(ConsentDecision::Accepted),
                None,
            )
            .await
            .unwrap();

        assert_eq!(view.region.id, RegionId::new("reg_uk"));
        assert!(view.customer.is_none());
        assert_eq!(view.payment.scope, PaymentScope::Unscoped);
        assert!(!view.cookie_consent_required);
        assert_eq!(backend.calls().retrieve_customer, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_identity_does_not_block_checkout() {
        let backend = Arc::new(FakeBackend::new());
        backend.add_customer("tok_slow", "slow@example.com");
        backend.set_customer_latency(Duration::from_secs(60));
        let mut session = SessionCookieStore::new(None, false);

        let started = tokio::time::Instant::now();
        let view = checkout(&backend)
            .compose(
                &CountryCode::parse("us").unwrap(),
                &mut session,
                &ConsentGate::default(),
                Some(SecretString::from("tok_slow")),
            )
            .await
            .unwrap();

        assert!(view.customer.is_none());
        assert!(view.cookie_consent_required);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_method_failure_is_an_error() {
        let backend = Arc::new(FakeBackend::new());
        backend.fail_methods(true);
        let mut session = SessionCookieStore::new(None, false);

        let err = checkout(&backend)
            .compose(
                &CountryCode::parse("us").unwrap(),
                &mut session,
                &ConsentGate::default(),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Methods(_)));
    }
}
