//! Short-lived read-through cache.
//!
//! Regions, shipping options and payment providers share the same policy:
//! a fixed TTL, recompute on miss or expiry, and no invalidation API.
//! Concurrent misses may both compute; the later insert wins, which is
//! fine because every writer fetches the same value for the same key.

use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache;

const MAX_CAPACITY: u64 = 1000;

/// A TTL cache over `moka` that only stores successful, present values.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<K, V>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries expire `ttl` after insertion.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(MAX_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    /// Return the cached value for `key`, or compute and cache it.
    ///
    /// `Ok(None)` results and errors are returned as-is and never cached,
    /// so a "not found" is looked up again on the next call.
    ///
    /// # Errors
    ///
    /// Returns whatever error `compute` returns.
    pub async fn get_or_try_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
    {
        if let Some(value) = self.inner.get(&key).await {
            return Ok(Some(value));
        }

        let computed = compute().await?;
        if let Some(value) = &computed {
            self.inner.insert(key, value.clone()).await;
        }
        Ok(computed)
    }
}
