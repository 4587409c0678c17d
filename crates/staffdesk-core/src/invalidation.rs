// ── Invalidation gateway ──
//
// Push-based: callers name the keys a successful mutation made stale.
// Nothing here infers affected keys from the mutated entity.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::info;

use crate::cache::{FetchCache, FetchResult, PendingFetch};
use crate::query::QueryKey;

/// Schedules refetches of observed keys in one [`FetchCache`].
pub struct InvalidationGateway<T> {
    cache: Arc<FetchCache<T>>,
}

impl<T> Clone for InvalidationGateway<T> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<T: Send + Sync + 'static> InvalidationGateway<T> {
    pub fn new(cache: Arc<FetchCache<T>>) -> Self {
        Self { cache }
    }

    /// Mark `key` stale and schedule its refetch. Returns the pending
    /// request, or `None` when no one observes the key. The cached data
    /// is not replaced until the request settles.
    pub fn invalidate(&self, key: &QueryKey) -> Option<PendingFetch<T>> {
        let pending = self.cache.refresh(key);
        if pending.is_some() {
            info!(%key, "invalidated");
        }
        pending
    }

    /// Invalidate every observed key matching `predicate`.
    pub fn invalidate_where(&self, predicate: impl Fn(&QueryKey) -> bool) -> Vec<PendingFetch<T>> {
        self.cache
            .observed_keys(predicate)
            .iter()
            .filter_map(|key| self.invalidate(key))
            .collect()
    }

    /// Invalidate every observed page of `endpoint`.
    pub fn invalidate_endpoint(&self, endpoint: &str) -> Vec<PendingFetch<T>> {
        self.invalidate_where(|key| key.endpoint() == endpoint)
    }

    /// Invalidate and wait for the refetch to settle.
    pub async fn invalidate_and_wait(&self, key: &QueryKey) -> Option<FetchResult<T>> {
        match self.invalidate(key) {
            Some(pending) => Some(pending.await),
            None => None,
        }
    }

    /// Predicate form of [`invalidate_and_wait`](Self::invalidate_and_wait).
    pub async fn invalidate_where_and_wait(
        &self,
        predicate: impl Fn(&QueryKey) -> bool,
    ) -> Vec<FetchResult<T>> {
        join_all(self.invalidate_where(predicate)).await
    }
}
