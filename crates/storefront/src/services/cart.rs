//! Cart lifecycle: lookup by cookie, creation bound to a region, update,
//! and line item price enrichment.
//!
//! This is the only component that decides to create a cart or discard a
//! cart reference.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tidewater_core::{
    Cart, CartId, CartUpdate, CartUpdateError, CountryCode, EnrichedLineItem, LineItem, Region,
    RegionId, VariantId, enrich_line_items,
};
use tracing::instrument;

use super::region::RegionResolver;
use crate::commerce::{CommerceBackend, CommerceError};
use crate::middleware::{ConsentGate, SessionCookieStore};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No region serves the requested country.
    #[error("no region for country {0}")]
    RegionNotFound(CountryCode),

    /// The cart reference is missing or does not resolve.
    #[error("no cart found")]
    NoCartFound,

    /// The update carried no allow-listed fields.
    #[error("no valid fields to update")]
    NoValidFields,

    /// An allow-listed field has an unusable value.
    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The commerce backend failed.
    #[error("commerce backend error: {0}")]
    Backend(#[from] CommerceError),
}

impl From<CartUpdateError> for CartError {
    fn from(err: CartUpdateError) -> Self {
        match err {
            CartUpdateError::NoValidFields => Self::NoValidFields,
            CartUpdateError::InvalidField { field, reason } => Self::InvalidField { field, reason },
        }
    }
}

/// Result of [`CartService::get_or_create`].
#[derive(Debug, Clone)]
pub struct CartOutcome {
    pub cart: Cart,
    pub region: Region,
    /// Whether a new cart was created for this request.
    pub created: bool,
    /// A new cart was created but its reference could not be persisted.
    pub cookie_consent_required: bool,
}

/// Cart lifecycle service.
#[derive(Clone)]
pub struct CartService {
    backend: Arc<dyn CommerceBackend>,
    regions: RegionResolver,
}

impl CartService {
    /// Create a cart service.
    #[must_use]
    pub fn new(backend: Arc<dyn CommerceBackend>, regions: RegionResolver) -> Self {
        Self { backend, regions }
    }

    /// Return the session's cart for `country`, creating one if needed.
    ///
    /// Steps run strictly in order: resolve the region, try the referenced
    /// cart, create a new one. A referenced cart that is gone, unreachable
    /// or priced in another currency is discarded, never re-priced. The
    /// new reference is persisted only with accepted consent.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::RegionNotFound`] if no region serves `country`,
    /// or [`CartError::Backend`] if region lookup or cart creation fails.
    /// Creation is not retried here.
    #[instrument(skip(self, session, consent), fields(country = %country, consent = %consent.decision()))]
    pub async fn get_or_create(
        &self,
        country: &CountryCode,
        session: &mut SessionCookieStore,
        consent: &ConsentGate,
    ) -> Result<CartOutcome, CartError> {
        let region = self
            .regions
            .resolve(country)
            .await?
            .ok_or_else(|| CartError::RegionNotFound(country.clone()))?;

        if let Some(cart_id) = session.get().cloned() {
            match self.backend.retrieve_cart(&cart_id).await {
                Ok(cart) if cart.matches_region(&region) => {
                    tracing::debug!(cart_id = %cart.id, "reusing referenced cart");
                    return Ok(CartOutcome {
                        cart,
                        region,
                        created: false,
                        cookie_consent_required: false,
                    });
                }
                Ok(cart) => {
                    tracing::info!(
                        cart_id = %cart.id,
                        cart_currency = %cart.currency_code,
                        region_currency = %region.currency_code,
                        "referenced cart is in another currency, creating a new one"
                    );
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(cart_id = %cart_id, "referenced cart no longer exists");
                }
                Err(e) => {
                    tracing::warn!(cart_id = %cart_id, error = %e, "could not retrieve referenced cart");
                }
            }
            // Without consent the client's cookies are left alone.
            if consent.allows_persistence() {
                session.clear();
            } else {
                session.forget();
            }
        }

        let cart = self.backend.create_cart(&region.id).await?;
        let persisted = session.set(&cart.id, consent);
        tracing::info!(cart_id = %cart.id, region_id = %region.id, persisted, "created cart");

        Ok(CartOutcome {
            cart,
            region,
            created: true,
            cookie_consent_required: !persisted,
        })
    }

    /// Price `items` for `region_id`.
    ///
    /// Never fails: items whose price cannot be looked up keep their
    /// last-known unit price.
    #[instrument(skip(self, items), fields(region_id = %region_id, items = items.len()))]
    pub async fn enrich(&self, items: &[LineItem], region_id: &RegionId) -> Vec<EnrichedLineItem> {
        let variant_ids: Vec<VariantId> = items
            .iter()
            .filter_map(|item| item.variant_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let prices = match self.backend.variant_prices(region_id, &variant_ids).await {
            Ok(prices) => prices,
            Err(e) => {
                tracing::warn!(error = %e, "price lookup failed, keeping last-known prices");
                Vec::new()
            }
        };

        enrich_line_items(items, region_id, &prices)
    }

    /// Apply the allow-listed subset of `fields` to a cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NoValidFields`] or [`CartError::InvalidField`]
    /// for unusable input, [`CartError::NoCartFound`] if the cart does not
    /// exist, or [`CartError::Backend`] for other backend failures.
    #[instrument(skip(self, fields), fields(cart_id = %cart_id))]
    pub async fn update(&self, cart_id: &CartId, fields: &Map<String, Value>) -> Result<Cart, CartError> {
        let update = CartUpdate::from_fields(fields)?;

        self.backend
            .update_cart(cart_id, &update)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    CartError::NoCartFound
                } else {
                    CartError::Backend(e)
                }
            })
    }
}
