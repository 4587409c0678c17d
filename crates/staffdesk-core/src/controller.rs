// ── Per-resource list controller ──
//
// Owns one list view's pagination and filter state, keeps a cache
// subscription on the derived key, and wraps mutations so a success
// invalidates the view's own key.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::cache::{FetchCache, PendingFetch, Subscription};
use crate::config::SubscribeOptions;
use crate::error::CoreError;
use crate::invalidation::InvalidationGateway;
use crate::model::{FilterState, FilterValue, ListPage, ListState, SortSpec};
use crate::query::QueryKey;
use crate::resource::Resource;

// ── View snapshot ───────────────────────────────────────────────────

/// Everything a list view renders.
#[derive(Debug)]
pub struct ListView<T> {
    /// Page being shown. With `keep_previous_data` this may belong to
    /// the previous key while the current one loads.
    pub page: Option<Arc<ListPage<T>>>,
    /// No data to show yet and a request is pending.
    pub is_loading: bool,
    /// A request for the current key is pending.
    pub is_validating: bool,
    pub error: Option<Arc<CoreError>>,
    /// `page` belongs to an earlier key.
    pub is_previous_data: bool,
}

impl<T> ListView<T> {
    pub fn items(&self) -> &[T] {
        self.page
            .as_deref()
            .map(|page| page.items.as_slice())
            .unwrap_or_default()
    }

    pub fn total(&self) -> u64 {
        self.page.as_ref().map_or(0, |page| page.total)
    }
}

impl<T> Clone for ListView<T> {
    fn clone(&self) -> Self {
        Self {
            page: self.page.clone(),
            is_loading: self.is_loading,
            is_validating: self.is_validating,
            error: self.error.clone(),
            is_previous_data: self.is_previous_data,
        }
    }
}

// ── Controller ──────────────────────────────────────────────────────

/// One paginated, filterable list of `T`.
///
/// Built with an injected resource and cache; views that need the
/// controller receive it explicitly.
pub struct ListController<T> {
    resource: Resource<T>,
    cache: Arc<FetchCache<ListPage<T>>>,
    gateway: InvalidationGateway<ListPage<T>>,
    options: SubscribeOptions,
    list: ListState,
    filter: FilterState,
    subscription: Subscription<ListPage<T>>,
    /// Last page shown for an earlier key.
    retained: Option<Arc<ListPage<T>>>,
}

impl<T: Send + Sync + 'static> ListController<T> {
    /// Create the controller and subscribe to its first page.
    pub fn new(
        resource: Resource<T>,
        cache: Arc<FetchCache<ListPage<T>>>,
        list: ListState,
        options: SubscribeOptions,
    ) -> Self {
        Self::with_filter(resource, cache, list, FilterState::new(), options)
    }

    /// Create the controller with an initial filter. Only the key for
    /// `list` + `filter` is subscribed; no unfiltered page is requested.
    pub fn with_filter(
        resource: Resource<T>,
        cache: Arc<FetchCache<ListPage<T>>>,
        list: ListState,
        filter: FilterState,
        options: SubscribeOptions,
    ) -> Self {
        let key = resource.keys().build(&list, &filter);
        let subscription = cache.subscribe(key, resource.fetcher());
        let gateway = InvalidationGateway::new(Arc::clone(&cache));
        Self {
            resource,
            cache,
            gateway,
            options,
            list,
            filter,
            subscription,
            retained: None,
        }
    }

    // ── State accessors ──────────────────────────────────────────────

    pub fn list(&self) -> &ListState {
        &self.list
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn options(&self) -> SubscribeOptions {
        self.options
    }

    /// Key of the page currently subscribed.
    pub fn key(&self) -> &QueryKey {
        self.subscription.key()
    }

    pub fn resource(&self) -> &Resource<T> {
        &self.resource
    }

    pub fn gateway(&self) -> &InvalidationGateway<ListPage<T>> {
        &self.gateway
    }

    // ── Pagination and filter setters ────────────────────────────────

    /// Replace the pagination state. A page-size change moves back to the
    /// first page.
    pub fn set_pagination(&mut self, mut list: ListState) {
        if list.page_size() != self.list.page_size() {
            list.set_page_index(0);
        }
        self.list = list;
        self.resubscribe();
    }

    pub fn set_page(&mut self, page_index: u32) {
        self.list.set_page_index(page_index);
        self.resubscribe();
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        let mut next = self.list.clone();
        next.set_page_size(page_size);
        self.set_pagination(next);
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.list.set_sort(sort);
        self.resubscribe();
    }

    /// Replace the filter. Any change to what is filtered moves back to
    /// the first page; an equivalent filter (same fields after dropping
    /// blanks and trimming) keeps the page.
    pub fn set_filter(&mut self, filter: FilterState) {
        if filter.normalized() != self.filter.normalized() {
            self.list.set_page_index(0);
        }
        self.filter = filter;
        self.resubscribe();
    }

    /// Set or clear one filter field.
    pub fn set_filter_field(&mut self, field: &str, value: Option<FilterValue>) {
        let mut filter = self.filter.clone();
        filter.set(field, value);
        self.set_filter(filter);
    }

    fn resubscribe(&mut self) {
        let key = self.resource.keys().build(&self.list, &self.filter);
        if &key == self.subscription.key() {
            return;
        }
        if let Some(data) = self.subscription.data() {
            self.retained = Some(data);
        }
        trace!(from = %self.subscription.key(), to = %key, "switching key");
        self.subscription = self.cache.subscribe(key, self.resource.fetcher());
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn view(&self) -> ListView<T> {
        let entry = self.subscription.current();
        let (page, is_previous_data) = match entry.data {
            Some(data) => (Some(data), false),
            None if self.options.keep_previous_data => {
                (self.retained.clone(), self.retained.is_some())
            }
            None => (None, false),
        };
        ListView {
            is_loading: page.is_none() && entry.is_validating,
            is_validating: entry.is_validating,
            error: entry.error,
            is_previous_data,
            page,
        }
    }

    /// Wait for the current key's entry to change. Returns `None` if the
    /// cache is gone.
    pub async fn changed(&mut self) -> Option<ListView<T>> {
        self.subscription.changed().await?;
        Some(self.view())
    }

    /// Wait until the current key has no request in flight.
    pub async fn settled(&mut self) -> ListView<T> {
        self.subscription.settled().await;
        self.view()
    }

    // ── Revalidation ─────────────────────────────────────────────────

    /// Force a refetch of the current key. Await the returned handle to
    /// wait for the result.
    pub fn refresh(&self) -> Option<PendingFetch<ListPage<T>>> {
        self.subscription.refresh()
    }

    /// The application regained focus.
    pub fn notify_focus(&self) -> Option<PendingFetch<ListPage<T>>> {
        if self.options.revalidate_on_focus {
            trace!(key = %self.key(), "revalidating on focus");
            self.refresh()
        } else {
            None
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Run a mutation; on success schedule a refetch of this controller's
    /// key. The refetch is not awaited. Failures are returned untouched
    /// and invalidate nothing.
    pub async fn mutate<R, F>(&self, mutation: F) -> Result<R, CoreError>
    where
        F: Future<Output = Result<R, CoreError>>,
    {
        match mutation.await {
            Ok(out) => {
                if self.gateway.invalidate(self.key()).is_none() {
                    trace!(key = %self.key(), "mutation succeeded; key not observed");
                }
                Ok(out)
            }
            Err(err) => {
                debug!(endpoint = self.resource.path(), error = %err, "mutation failed");
                Err(err)
            }
        }
    }

    pub async fn create(&self, body: Value) -> Result<Option<Value>, CoreError> {
        self.mutate(self.resource.endpoint().create(body)).await
    }

    pub async fn update(&self, id: &str, body: Value) -> Result<Option<Value>, CoreError> {
        self.mutate(self.resource.endpoint().update(id, body)).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), CoreError> {
        self.mutate(self.resource.endpoint().delete(id)).await
    }
}
