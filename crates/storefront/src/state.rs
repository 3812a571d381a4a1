//! Application state shared across handlers.

use std::sync::Arc;

use crate::commerce::CommerceBackend;
use crate::config::StorefrontConfig;
use crate::services::{CartService, CheckoutService, IdentityResolver, MethodCache, RegionResolver};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Services are built once
/// over a single commerce backend, so their caches are process-wide.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    regions: RegionResolver,
    carts: CartService,
    checkout: CheckoutService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration (cache TTLs, identity timeout)
    /// * `backend` - Commerce backend every service talks to
    #[must_use]
    pub fn new(config: StorefrontConfig, backend: Arc<dyn CommerceBackend>) -> Self {
        let regions = RegionResolver::new(Arc::clone(&backend), config.cache.region_ttl);
        let carts = CartService::new(Arc::clone(&backend), regions.clone());
        let methods = MethodCache::new(Arc::clone(&backend), config.cache.method_ttl);
        let identity = IdentityResolver::new(backend, config.identity_timeout);
        let checkout = CheckoutService::new(carts.clone(), methods, identity);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                regions,
                carts,
                checkout,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the region resolver.
    #[must_use]
    pub fn regions(&self) -> &RegionResolver {
        &self.inner.regions
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }

    /// Get a reference to the checkout composer.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
