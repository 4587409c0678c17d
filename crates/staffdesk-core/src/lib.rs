// staffdesk-core: List data layer between staffdesk-api and consumers (CLI, views).
//
// Query keys, a stale-while-revalidate fetch cache with request
// de-duplication, explicit invalidation, exhaustive page accumulation,
// and per-resource list controllers composing them.

pub mod accumulator;
pub mod cache;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod invalidation;
pub mod model;
pub mod query;
pub mod resource;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use accumulator::{Accumulator, AccumulatorState, AccumulatorView};
pub use cache::{CacheEntry, FetchCache, Fetcher, PendingFetch, Subscription};
pub use config::{ConsoleConfig, SubscribeOptions};
pub use console::Console;
pub use controller::{ListController, ListView};
pub use error::{CoreError, ErrorKind};
pub use invalidation::InvalidationGateway;
pub use query::{KeyBuilder, QueryKey, build_key};
pub use resource::{Adapter, Endpoint, EnvelopeAdapter, HttpEndpoint, Resource};

pub use model::{FilterState, FilterValue, ListPage, ListState, SortDirection, SortSpec};
