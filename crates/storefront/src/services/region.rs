//! Country code to region resolution.

use std::sync::Arc;
use std::time::Duration;

use tidewater_core::{CountryCode, Region};
use tracing::instrument;

use crate::cache::TtlCache;
use crate::commerce::{CommerceBackend, CommerceError};

/// Resolves country codes to commerce regions.
///
/// The whole region list is cached for a few minutes, so lookups for
/// unserved countries are answered from the cache too.
#[derive(Clone)]
pub struct RegionResolver {
    backend: Arc<dyn CommerceBackend>,
    cache: TtlCache<(), Arc<[Region]>>,
}

impl RegionResolver {
    /// Create a resolver whose entries live for `ttl`.
    #[must_use]
    pub fn new(backend: Arc<dyn CommerceBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            cache: TtlCache::new(ttl),
        }
    }

    /// Resolve `country` to the region that serves it.
    ///
    /// `Ok(None)` is the normal "no region for this country" outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only if the region list could not be fetched.
    #[instrument(skip(self), fields(country = %country))]
    pub async fn resolve(&self, country: &CountryCode) -> Result<Option<Region>, CommerceError> {
        let regions = self
            .cache
            .get_or_try_compute((), || async {
                let regions = self.backend.list_regions().await?;
                tracing::debug!(count = regions.len(), "fetched region list");
                Ok::<_, CommerceError>(Some(Arc::from(regions)))
            })
            .await?
            .unwrap_or_default();

        let region = regions.iter().find(|region| region.serves(country)).cloned();
        if region.is_none() {
            tracing::debug!("no region serves country");
        }
        Ok(region)
    }
}
