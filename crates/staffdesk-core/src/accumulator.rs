// ── Exhaustive pagination accumulator ──
//
// Walks a collection page by page until a page signals completion, for
// dropdowns and other views that need every row. The walk is an explicit
// async loop; shared state is published through a `watch` channel so
// several views can observe one accumulation.

use std::pin::pin;
use std::sync::Arc;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::FetchCache;
use crate::error::CoreError;
use crate::model::{FilterState, ListPage, ListState};
use crate::query::QueryKey;
use crate::resource::Resource;

/// Page size used when none is configured.
pub const DEFAULT_ACCUMULATOR_PAGE_SIZE: u32 = 50;

/// Full accumulation state.
#[derive(Debug)]
pub struct AccumulatorState<T> {
    pub pages_fetched: u32,
    /// Concatenation of every fetched page, in page order.
    pub items: Arc<Vec<T>>,
    /// 1-based number of the next page to request.
    pub next_page: u32,
    pub is_done: bool,
    /// A page request is pending. At most one at a time.
    pub is_loading_more: bool,
    pub error: Option<Arc<CoreError>>,
    session: u64,
}

impl<T> AccumulatorState<T> {
    fn fresh(session: u64) -> Self {
        Self {
            pages_fetched: 0,
            items: Arc::new(Vec::new()),
            next_page: 1,
            is_done: false,
            is_loading_more: false,
            error: None,
            session,
        }
    }

    /// Combined flag: true until the walk is done, unless it stopped on
    /// an error.
    pub fn is_loading(&self) -> bool {
        !self.is_done && self.error.is_none()
    }
}

impl<T> Clone for AccumulatorState<T> {
    fn clone(&self) -> Self {
        Self {
            pages_fetched: self.pages_fetched,
            items: Arc::clone(&self.items),
            next_page: self.next_page,
            is_done: self.is_done,
            is_loading_more: self.is_loading_more,
            error: self.error.clone(),
            session: self.session,
        }
    }
}

/// What a view renders: `{ items, is_loading, error }`.
#[derive(Debug)]
pub struct AccumulatorView<T> {
    pub items: Arc<Vec<T>>,
    pub is_loading: bool,
    pub error: Option<Arc<CoreError>>,
}

impl<T> Clone for AccumulatorView<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            is_loading: self.is_loading,
            error: self.error.clone(),
        }
    }
}

/// Fetches every page of one resource under a fixed filter.
pub struct Accumulator<T> {
    resource: Resource<T>,
    cache: Arc<FetchCache<ListPage<T>>>,
    filter: FilterState,
    page_size: u32,
    state: watch::Sender<AccumulatorState<T>>,
}

/// Clears `is_loading_more` when a run ends, including when the run
/// future is dropped mid-page.
struct LoadingGuard<'a, T> {
    state: &'a watch::Sender<AccumulatorState<T>>,
    session: u64,
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        self.state.send_if_modified(|s| {
            if s.session == self.session && s.is_loading_more {
                s.is_loading_more = false;
                true
            } else {
                false
            }
        });
    }
}

impl<T: Clone + Send + Sync + 'static> Accumulator<T> {
    pub fn new(resource: Resource<T>, cache: Arc<FetchCache<ListPage<T>>>) -> Self {
        let (state, _) = watch::channel(AccumulatorState::fresh(0));
        Self {
            resource,
            cache,
            filter: FilterState::new(),
            page_size: DEFAULT_ACCUMULATOR_PAGE_SIZE,
            state,
        }
    }

    /// Restrict the walk to rows matching `filter`.
    pub fn with_filter(mut self, filter: FilterState) -> Self {
        self.filter = filter.normalized();
        self
    }

    /// Rows requested per page (minimum 1).
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Cache key of the page at 0-based `index`.
    pub fn key_for(&self, index: u32) -> QueryKey {
        self.resource
            .keys()
            .build(&ListState::new(self.page_size).with_page(index), &self.filter)
    }

    // ── Page stream ──────────────────────────────────────────────────

    /// Stream every page from the first, ending after the page that
    /// signals completion. Stops at the first error.
    ///
    /// The stream does not touch the accumulator's shared state; use
    /// [`run`](Self::run) for that.
    pub fn pages(&self) -> impl Stream<Item = Result<Arc<ListPage<T>>, CoreError>> + Send + 'static {
        self.pages_from(0)
    }

    fn pages_from(
        &self,
        start: u32,
    ) -> impl Stream<Item = Result<Arc<ListPage<T>>, CoreError>> + Send + 'static {
        let cache = Arc::clone(&self.cache);
        let fetcher = self.resource.fetcher();
        let keys = self.resource.keys().clone();
        let filter = self.filter.clone();
        let page_size = self.page_size;

        try_stream! {
            let mut index = start;
            loop {
                let key = keys.build(&ListState::new(page_size).with_page(index), &filter);
                let page = cache.fetch(&key, &fetcher).await.map_err(|source| {
                    CoreError::Accumulator {
                        endpoint: key.endpoint().to_owned(),
                        page: index.saturating_add(1),
                        source,
                    }
                })?;
                let done = page.signals_completion(page_size);
                yield page;
                if done {
                    break;
                }
                index = index.saturating_add(1);
            }
        }
    }

    // ── Driving the shared state ─────────────────────────────────────

    /// Fetch pages until done, publishing each one as it lands.
    ///
    /// Only one run is active at a time: a concurrent call waits for the
    /// active run and returns its result. After an error a new run
    /// resumes from the page that failed.
    pub async fn run(&self) -> AccumulatorView<T> {
        let mut session = 0;
        let mut start = 0;
        let started = self.state.send_if_modified(|s| {
            if s.is_loading_more || s.is_done {
                return false;
            }
            s.is_loading_more = true;
            s.error = None;
            session = s.session;
            start = s.next_page.saturating_sub(1);
            true
        });

        if !started {
            let mut rx = self.state.subscribe();
            // Only fails if the sender is gone, which `self` rules out.
            let _ = rx.wait_for(|s| !s.is_loading_more).await;
            return self.view();
        }

        let guard = LoadingGuard {
            state: &self.state,
            session,
        };
        debug!(endpoint = self.resource.path(), page = start + 1, "accumulating");

        let mut pages = pin!(self.pages_from(start));
        while let Some(result) = pages.next().await {
            let applied = match result {
                Ok(page) => self.apply_page(session, &page),
                Err(err) => {
                    warn!(error = %err, "accumulation stopped");
                    self.apply_error(session, err)
                }
            };
            if !applied {
                debug!(endpoint = self.resource.path(), "accumulation superseded by reset");
                break;
            }
        }

        drop(guard);
        self.view()
    }

    fn apply_page(&self, session: u64, page: &ListPage<T>) -> bool {
        let done = page.signals_completion(self.page_size);
        self.state.send_if_modified(|s| {
            if s.session != session {
                return false;
            }
            Arc::make_mut(&mut s.items).extend(page.items.iter().cloned());
            s.pages_fetched += 1;
            s.next_page += 1;
            s.is_done = done;
            true
        })
    }

    fn apply_error(&self, session: u64, err: CoreError) -> bool {
        let err = Arc::new(err);
        self.state.send_if_modified(|s| {
            if s.session != session {
                return false;
            }
            s.error = Some(Arc::clone(&err));
            true
        })
    }

    /// Discard everything fetched so far. A run in progress stops at its
    /// next page without publishing it.
    pub fn reset(&self) {
        self.state.send_modify(|s| {
            let session = s.session.wrapping_add(1);
            *s = AccumulatorState::fresh(session);
        });
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn state(&self) -> AccumulatorState<T> {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> AccumulatorView<T> {
        let s = self.state.borrow();
        AccumulatorView {
            items: Arc::clone(&s.items),
            is_loading: s.is_loading(),
            error: s.error.clone(),
        }
    }

    /// Receiver for `changed().await`-style observation.
    pub fn subscribe(&self) -> watch::Receiver<AccumulatorState<T>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::testing::MockEndpoint;

    #[derive(Debug, Clone, Deserialize, PartialEq)]
    struct Row {
        id: String,
        name: String,
    }

    fn accumulator(endpoint: &MockEndpoint) -> Accumulator<Row> {
        let resource = Resource::new(Arc::new(endpoint.clone()));
        Accumulator::new(resource, Arc::new(FetchCache::new()))
    }

    #[tokio::test]
    async fn stops_on_short_page() {
        let endpoint = MockEndpoint::new("api/positions", 137);
        let acc = accumulator(&endpoint);

        let view = acc.run().await;
        assert_eq!(view.items.len(), 137);
        assert!(!view.is_loading);
        assert!(view.error.is_none());
        assert_eq!(view.items[0].id, "1");
        assert_eq!(view.items[136].id, "137");

        let state = acc.state();
        assert_eq!(state.pages_fetched, 3);
        assert!(state.is_done);
        assert!(!state.is_loading_more);
        assert_eq!(endpoint.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn exact_multiple_needs_empty_page() {
        let endpoint = MockEndpoint::new("api/positions", 100);
        let acc = accumulator(&endpoint);

        assert_eq!(acc.run().await.items.len(), 100);
        assert_eq!(endpoint.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn empty_collection() {
        let endpoint = MockEndpoint::new("api/positions", 0);
        let acc = accumulator(&endpoint);

        let view = acc.run().await;
        assert!(view.items.is_empty());
        assert!(!view.is_loading);
        assert_eq!(endpoint.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn error_keeps_prefix_and_resumes() {
        let endpoint = MockEndpoint::new("api/positions", 120);
        endpoint.fail_on_page(Some(2));
        let acc = accumulator(&endpoint);

        let view = acc.run().await;
        assert_eq!(view.items.len(), 50);
        assert!(!view.is_loading);
        match view.error.as_deref() {
            Some(CoreError::Accumulator { page, endpoint, .. }) => {
                assert_eq!(*page, 2);
                assert_eq!(endpoint, "api/positions");
            }
            other => panic!("expected accumulator error, got {other:?}"),
        }

        endpoint.fail_on_page(None);
        let view = acc.run().await;
        assert_eq!(view.items.len(), 120);
        assert!(view.error.is_none());
        assert_eq!(endpoint.requested_pages(), vec![1, 2, 2, 3]);
    }

    #[tokio::test]
    async fn concurrent_runs_share_one_walk() {
        let endpoint = MockEndpoint::new("api/positions", 60);
        let acc = accumulator(&endpoint);

        let (a, b) = tokio::join!(acc.run(), acc.run());
        assert_eq!(a.items.len(), 60);
        assert!(Arc::ptr_eq(&a.items, &b.items));
        assert_eq!(endpoint.requested_pages(), vec![1, 2]);

        // Done: further runs fetch nothing.
        acc.run().await;
        assert_eq!(endpoint.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn reset_starts_over() {
        let endpoint = MockEndpoint::new("api/positions", 10);
        let acc = accumulator(&endpoint).with_page_size(4);

        assert_eq!(acc.run().await.items.len(), 10);
        acc.reset();
        let view = acc.view();
        assert!(view.items.is_empty());
        assert!(view.is_loading);

        assert_eq!(acc.run().await.items.len(), 10);
        assert_eq!(endpoint.requested_pages(), vec![1, 2, 3, 1, 2, 3]);
    }

    #[tokio::test]
    async fn filter_is_sent_with_every_page() {
        let endpoint = MockEndpoint::new("api/positions", 30);
        let acc = accumulator(&endpoint)
            .with_page_size(2)
            .with_filter(FilterState::new().with("Search", "row 1"));

        // "row 1" and "row 10".."row 19"
        assert_eq!(acc.run().await.items.len(), 11);
        assert!(
            endpoint
                .requests()
                .iter()
                .all(|k| k.get("SearchTerm") == Some("row 1"))
        );
    }

    #[tokio::test]
    async fn page_stream_yields_in_order() {
        let endpoint = MockEndpoint::new("api/positions", 7);
        let acc = accumulator(&endpoint).with_page_size(3);

        let sizes: Vec<usize> = acc
            .pages()
            .map(|page| page.unwrap().len())
            .collect()
            .await;
        assert_eq!(sizes, vec![3, 3, 1]);
        assert!(acc.state().items.is_empty());
    }
}
