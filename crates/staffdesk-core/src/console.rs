// ── Console facade ──
//
// Owns the API client, the runtime config, and one fetch cache per
// payload type. Hands out resources, controllers, and accumulators
// wired to the shared caches. Nothing here is process-global: create
// one `Console` and pass it to whatever needs it.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use staffdesk_api::ApiClient;
use tracing::debug;

use crate::accumulator::Accumulator;
use crate::cache::FetchCache;
use crate::config::ConsoleConfig;
use crate::controller::ListController;
use crate::error::CoreError;
use crate::invalidation::InvalidationGateway;
use crate::model::{ListPage, ListState};
use crate::resource::{HttpEndpoint, Resource};

type AnyCache = Arc<dyn Any + Send + Sync>;

pub struct Console {
    client: ApiClient,
    config: ConsoleConfig,
    caches: DashMap<TypeId, AnyCache>,
}

impl Console {
    /// Build the HTTP client from `config`.
    pub fn connect(config: ConsoleConfig) -> Result<Self, CoreError> {
        let client = ApiClient::new(config.base_url.as_str(), &config.transport())?;
        debug!(base_url = %config.base_url, "console client ready");
        Ok(Self::with_client(client, config))
    }

    /// Use an existing client (tests, custom transports).
    pub fn with_client(client: ApiClient, config: ConsoleConfig) -> Self {
        Self {
            client,
            config,
            caches: DashMap::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// The shared cache for lists of `T`, created on first use.
    pub fn cache<T: Send + Sync + 'static>(&self) -> Arc<FetchCache<ListPage<T>>> {
        let entry = self
            .caches
            .entry(TypeId::of::<ListPage<T>>())
            .or_insert_with(|| Arc::new(FetchCache::<ListPage<T>>::new()) as AnyCache)
            .clone();
        // The map is keyed by the payload's TypeId, so the downcast matches.
        entry
            .downcast::<FetchCache<ListPage<T>>>()
            .unwrap_or_else(|_| Arc::new(FetchCache::new()))
    }

    /// HTTP-backed resource at `path` using the default envelope adapter.
    pub fn resource<T>(&self, path: &str) -> Resource<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        Resource::new(Arc::new(HttpEndpoint::new(self.client.clone(), path)))
    }

    /// List controller on the first page at the configured page size.
    pub fn controller<T: Send + Sync + 'static>(&self, resource: Resource<T>) -> ListController<T> {
        ListController::new(
            resource,
            self.cache::<T>(),
            ListState::new(self.config.default_page_size),
            self.config.subscribe,
        )
    }

    pub fn accumulator<T: Clone + Send + Sync + 'static>(&self, resource: Resource<T>) -> Accumulator<T> {
        Accumulator::new(resource, self.cache::<T>())
            .with_page_size(self.config.accumulator_page_size)
    }

    /// Gateway over the cache for lists of `T`, for invalidating keys
    /// held by other controllers.
    pub fn gateway<T: Send + Sync + 'static>(&self) -> InvalidationGateway<ListPage<T>> {
        InvalidationGateway::new(self.cache::<T>())
    }
}
