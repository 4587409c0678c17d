// ── Stale-while-revalidate fetch cache ──
//
// One entry per query key, request de-duplication through shared
// futures, and push-based change notification via `watch` channels.

mod entry;
mod store;
mod subscription;

use std::sync::Arc;

use futures_util::future::BoxFuture;

pub use entry::CacheEntry;
pub use store::{ErrorHook, FetchCache, FetchResult, PendingFetch};
pub use subscription::Subscription;

#[cfg(test)]
pub(crate) use store::tests;

use crate::error::CoreError;
use crate::query::QueryKey;

/// Produces the request future for a key. Registered with the cache on
/// subscription so later refreshes and invalidations can replay it.
///
/// Calling the fetcher must only build the future; the cache may call it
/// while holding the entry for `key`.
pub type Fetcher<T> = Arc<dyn Fn(QueryKey) -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync>;
