// ── Fetch cache core ──
//
// A `DashMap` of slots keyed by `QueryKey`. Each slot owns a `watch`
// sender (subscribers hold the receivers) and at most one in-flight
// request, shared between every caller that asks for the key while it is
// pending. A forced refresh queues behind the running request, so
// responses for one key always land in issue order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use super::{CacheEntry, Fetcher, Subscription};
use crate::error::CoreError;
use crate::query::QueryKey;

/// Outcome of one request as seen by every waiter.
pub type FetchResult<T> = Result<Arc<T>, Arc<CoreError>>;

/// Handle to an in-flight request. Awaiting it yields the request's own
/// outcome; the cache entry is updated whether or not anyone awaits.
pub type PendingFetch<T> = Shared<BoxFuture<'static, FetchResult<T>>>;

/// Called after every failed request, for observability.
pub type ErrorHook = Arc<dyn Fn(&QueryKey, &CoreError) + Send + Sync>;

struct InFlight<T> {
    generation: u64,
    request: PendingFetch<T>,
    /// False while a queued refresh waits for the previous request.
    issued: Arc<AtomicBool>,
}

struct Slot<T> {
    state: watch::Sender<CacheEntry<T>>,
    inflight: Option<InFlight<T>>,
    /// Bumped for every request issued for this key.
    generation: u64,
    /// Generation of the response currently in `state`.
    applied: u64,
    /// Fetcher of the most recent subscriber, replayed by `refresh`.
    fetcher: Option<Fetcher<T>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        let (state, _) = watch::channel(CacheEntry::default());
        Self {
            state,
            inflight: None,
            generation: 0,
            applied: 0,
            fetcher: None,
        }
    }

    fn is_observed(&self) -> bool {
        self.state.receiver_count() > 0
    }
}

/// Stale-while-revalidate store for payloads of type `T`.
///
/// Entries are never evicted implicitly; see
/// [`evict_unobserved`](Self::evict_unobserved).
pub struct FetchCache<T> {
    slots: DashMap<QueryKey, Slot<T>>,
    on_error: ErrorHook,
}

impl<T: Send + Sync + 'static> FetchCache<T> {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            on_error: Arc::new(|key, err| warn!(%key, error = %err, "fetch failed")),
        }
    }

    /// Replace the default (logging) error callback.
    pub fn with_error_hook(
        mut self,
        hook: impl Fn(&QueryKey, &CoreError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Arc::new(hook);
        self
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Observe `key`. Starts a request unless one is already in flight,
    /// in which case the subscription attaches to it. Cached data, if
    /// any, is visible immediately while the revalidation runs.
    pub fn subscribe(self: &Arc<Self>, key: QueryKey, fetcher: Fetcher<T>) -> Subscription<T> {
        let receiver = {
            let mut slot = self.slots.entry(key.clone()).or_insert_with(Slot::new);
            slot.fetcher = Some(Arc::clone(&fetcher));
            slot.state.subscribe()
        };
        self.start(&key, &fetcher, false);
        Subscription::new(Arc::clone(self), key, receiver)
    }

    /// Fetch `key` without subscribing, joining an in-flight request if
    /// there is one. The result is cached like any other.
    pub async fn fetch(self: &Arc<Self>, key: &QueryKey, fetcher: &Fetcher<T>) -> FetchResult<T> {
        self.start(key, fetcher, false).await
    }

    /// Force a new request for `key`, bypassing cached data. The request
    /// starts once any request already in flight settles; a refresh still
    /// queued behind one is joined instead. No-op (returns `None`) when nobody
    /// currently subscribes to the key.
    pub fn refresh(self: &Arc<Self>, key: &QueryKey) -> Option<PendingFetch<T>> {
        let fetcher = {
            let slot = self.slots.get(key)?;
            if !slot.is_observed() {
                trace!(%key, "refresh ignored: no subscribers");
                return None;
            }
            slot.fetcher.clone()?
        };
        Some(self.start(key, &fetcher, true))
    }

    // ── Inspection ───────────────────────────────────────────────────

    /// Current entry for `key` without subscribing.
    pub fn peek(&self, key: &QueryKey) -> Option<CacheEntry<T>> {
        self.slots.get(key).map(|slot| slot.state.borrow().clone())
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.slots.contains_key(key)
    }

    pub fn is_in_flight(&self, key: &QueryKey) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| slot.inflight.is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Keys with at least one live subscriber that satisfy `predicate`.
    pub fn observed_keys(&self, predicate: impl Fn(&QueryKey) -> bool) -> Vec<QueryKey> {
        self.slots
            .iter()
            .filter(|slot| slot.value().is_observed() && predicate(slot.key()))
            .map(|slot| slot.key().clone())
            .collect()
    }

    /// Drop entries nobody observes and nothing is fetching. Returns the
    /// number of entries removed.
    pub fn evict_unobserved(&self) -> usize {
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| slot.is_observed() || slot.inflight.is_some());
        let removed = before.saturating_sub(self.slots.len());
        if removed > 0 {
            debug!(removed, "evicted unobserved cache entries");
        }
        removed
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Issue (or join) a request for `key`. The request is spawned on the
    /// ambient tokio runtime so it settles even if every waiter goes away.
    fn start(self: &Arc<Self>, key: &QueryKey, fetcher: &Fetcher<T>, force: bool) -> PendingFetch<T> {
        let mut slot = self.slots.entry(key.clone()).or_insert_with(Slot::new);
        let previous = match &slot.inflight {
            Some(inflight) if !force || !inflight.issued.load(Ordering::SeqCst) => {
                trace!(%key, generation = inflight.generation, "joining in-flight request");
                return inflight.request.clone();
            }
            Some(inflight) => Some(inflight.request.clone()),
            None => None,
        };

        slot.generation += 1;
        let generation = slot.generation;

        // Without a predecessor the request is built right away.
        let immediate = previous.is_none().then(|| {
            debug!(%key, generation, "fetching");
            fetcher(key.clone())
        });
        let issued = Arc::new(AtomicBool::new(immediate.is_some()));

        let cache = Arc::clone(self);
        let fetcher = Arc::clone(fetcher);
        let settle_key = key.clone();
        let started = Arc::clone(&issued);
        let pending: PendingFetch<T> = async move {
            let request = match immediate {
                Some(request) => request,
                None => {
                    if let Some(previous) = previous {
                        trace!(key = %settle_key, generation, "waiting for previous request");
                        if let Err(err) = previous.await {
                            trace!(key = %settle_key, error = %err, "previous request failed");
                        }
                    }
                    started.store(true, Ordering::SeqCst);
                    debug!(key = %settle_key, generation, "fetching");
                    fetcher(settle_key.clone())
                }
            };
            let outcome: FetchResult<T> = request.await.map(Arc::new).map_err(Arc::new);
            cache.settle(&settle_key, generation, &outcome);
            outcome
        }
        .boxed()
        .shared();

        slot.inflight = Some(InFlight {
            generation,
            request: pending.clone(),
            issued,
        });
        slot.state.send_modify(|entry| entry.is_validating = true);
        drop(slot);

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(pending.clone());
        }
        pending
    }

    /// Write a finished request into its entry. The entry stays validating
    /// until the newest generation settles, and a response older than the
    /// one already applied is handed to its own waiters only.
    fn settle(&self, key: &QueryKey, generation: u64, outcome: &FetchResult<T>) {
        {
            let Some(mut slot) = self.slots.get_mut(key) else {
                return;
            };
            if slot
                .inflight
                .as_ref()
                .is_some_and(|f| f.generation == generation)
            {
                slot.inflight = None;
            }
            if generation < slot.applied {
                trace!(%key, generation, applied = slot.applied, "discarding superseded response");
                return;
            }
            slot.applied = generation;
            let still_validating = slot.inflight.is_some();

            // `send_modify` updates unconditionally, even with zero receivers.
            slot.state.send_modify(|entry| {
                match outcome {
                    Ok(data) => {
                        entry.data = Some(Arc::clone(data));
                        entry.error = None;
                        entry.last_updated = Some(Utc::now());
                    }
                    Err(err) => entry.error = Some(Arc::clone(err)),
                }
                entry.is_validating = still_validating;
            });

            if !slot.is_observed() {
                trace!(%key, generation, "settled with no subscribers");
            }
        }

        if let Err(err) = outcome {
            (self.on_error)(key, err);
        }
    }
}

impl<T: Send + Sync + 'static> Default for FetchCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
