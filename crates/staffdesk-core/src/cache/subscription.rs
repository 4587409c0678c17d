use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::{CacheEntry, FetchCache, PendingFetch};
use crate::error::CoreError;
use crate::query::QueryKey;

/// A live view of one cache key.
///
/// Dropping the subscription stops observing the key; requests already
/// in flight still settle into the cache.
pub struct Subscription<T> {
    cache: Arc<FetchCache<T>>,
    key: QueryKey,
    receiver: watch::Receiver<CacheEntry<T>>,
}

impl<T: Send + Sync + 'static> Subscription<T> {
    pub(crate) fn new(
        cache: Arc<FetchCache<T>>,
        key: QueryKey,
        receiver: watch::Receiver<CacheEntry<T>>,
    ) -> Self {
        Self {
            cache,
            key,
            receiver,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Latest entry state.
    pub fn current(&self) -> CacheEntry<T> {
        self.receiver.borrow().clone()
    }

    pub fn data(&self) -> Option<Arc<T>> {
        self.receiver.borrow().data.clone()
    }

    pub fn error(&self) -> Option<Arc<CoreError>> {
        self.receiver.borrow().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.receiver.borrow().is_loading()
    }

    pub fn is_validating(&self) -> bool {
        self.receiver.borrow().is_validating
    }

    /// Force a refetch of this key. See [`FetchCache::refresh`].
    pub fn refresh(&self) -> Option<PendingFetch<T>> {
        self.cache.refresh(&self.key)
    }

    /// Wait for the next change, returning the new entry.
    /// Returns `None` if the cache has been dropped.
    pub async fn changed(&mut self) -> Option<CacheEntry<T>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until no request is in flight for this key.
    pub async fn settled(&mut self) -> CacheEntry<T> {
        loop {
            {
                let entry = self.receiver.borrow_and_update();
                if !entry.is_validating {
                    return entry.clone();
                }
            }
            if self.receiver.changed().await.is_err() {
                return self.current();
            }
        }
    }

    /// Convert into a `Stream` of entry states for `StreamExt` combinators.
    pub fn into_stream(self) -> WatchStream<CacheEntry<T>> {
        WatchStream::new(self.receiver)
    }
}
