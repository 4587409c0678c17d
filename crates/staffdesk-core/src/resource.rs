// ── Resource bindings ──
//
// What varies per entity type: where the collection lives, how its
// raw response turns into a `ListPage`, and which filter fields are
// renamed on the wire. Everything else is shared controller machinery.

use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use staffdesk_api::{ApiClient, RawListResponse};

use crate::cache::Fetcher;
use crate::error::CoreError;
use crate::model::ListPage;
use crate::query::{KeyBuilder, QueryKey};

// ── Endpoint ────────────────────────────────────────────────────────

/// Remote collection with list and mutation calls. The returned futures
/// own everything they need so the cache can spawn them.
pub trait Endpoint: Send + Sync {
    /// Collection path, e.g. `"api/employees"`.
    fn path(&self) -> &str;

    fn fetch(&self, key: &QueryKey) -> BoxFuture<'static, Result<Value, CoreError>>;

    fn create(&self, body: Value) -> BoxFuture<'static, Result<Option<Value>, CoreError>>;

    fn update(&self, id: &str, body: Value) -> BoxFuture<'static, Result<Option<Value>, CoreError>>;

    fn delete(&self, id: &str) -> BoxFuture<'static, Result<(), CoreError>>;
}

/// [`Endpoint`] backed by the REST client.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: ApiClient,
    path: String,
}

impl HttpEndpoint {
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }
}

impl Endpoint for HttpEndpoint {
    fn path(&self) -> &str {
        &self.path
    }

    fn fetch(&self, key: &QueryKey) -> BoxFuture<'static, Result<Value, CoreError>> {
        let client = self.client.clone();
        let path = self.path.clone();
        let params = key.query_pairs();
        async move {
            client
                .get_list(&path, &params)
                .await
                .map_err(|e| with_endpoint(e.into(), &path))
        }
        .boxed()
    }

    fn create(&self, body: Value) -> BoxFuture<'static, Result<Option<Value>, CoreError>> {
        let client = self.client.clone();
        let path = self.path.clone();
        async move { Ok(client.create(&path, &body).await?) }.boxed()
    }

    fn update(&self, id: &str, body: Value) -> BoxFuture<'static, Result<Option<Value>, CoreError>> {
        let client = self.client.clone();
        let path = self.path.clone();
        let id = id.to_owned();
        async move { Ok(client.update(&path, &id, &body).await?) }.boxed()
    }

    fn delete(&self, id: &str) -> BoxFuture<'static, Result<(), CoreError>> {
        let client = self.client.clone();
        let path = self.path.clone();
        let id = id.to_owned();
        async move { Ok(client.delete(&path, &id).await?) }.boxed()
    }
}

/// Fill in the endpoint on decode errors raised below the core.
fn with_endpoint(err: CoreError, path: &str) -> CoreError {
    match err {
        CoreError::Decode { endpoint, message } if endpoint.is_empty() => CoreError::Decode {
            endpoint: path.to_owned(),
            message,
        },
        other => other,
    }
}

// ── Adapter ─────────────────────────────────────────────────────────

/// Turns a raw list response into `{items, total}`.
pub trait Adapter<T>: Send + Sync {
    fn adapt(&self, endpoint: &str, raw: Value) -> Result<ListPage<T>, CoreError>;
}

impl<T, F> Adapter<T> for F
where
    F: Fn(Value) -> Result<ListPage<T>, CoreError> + Send + Sync,
{
    fn adapt(&self, _endpoint: &str, raw: Value) -> Result<ListPage<T>, CoreError> {
        self(raw)
    }
}

/// Default adapter: accepts `{ items, totalItems }` or a bare array.
pub struct EnvelopeAdapter<T>(PhantomData<fn() -> T>);

impl<T> EnvelopeAdapter<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for EnvelopeAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Adapter<T> for EnvelopeAdapter<T> {
    fn adapt(&self, endpoint: &str, raw: Value) -> Result<ListPage<T>, CoreError> {
        let parsed: RawListResponse<T> =
            serde_json::from_value(raw).map_err(|e| CoreError::Decode {
                endpoint: endpoint.to_owned(),
                message: e.to_string(),
            })?;
        let (items, total) = parsed.into_parts();
        Ok(ListPage::new(items, total))
    }
}

// ── Resource ────────────────────────────────────────────────────────

/// Everything a controller needs to know about one entity type.
pub struct Resource<T> {
    endpoint: Arc<dyn Endpoint>,
    adapter: Arc<dyn Adapter<T>>,
    keys: KeyBuilder,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            endpoint: Arc::clone(&self.endpoint),
            adapter: Arc::clone(&self.adapter),
            keys: self.keys.clone(),
        }
    }
}

impl<T: DeserializeOwned + Send + Sync + 'static> Resource<T> {
    /// Resource using the [`EnvelopeAdapter`].
    pub fn new(endpoint: Arc<dyn Endpoint>) -> Self {
        Self::with_adapter(endpoint, Arc::new(EnvelopeAdapter::<T>::new()))
    }
}

impl<T: Send + Sync + 'static> Resource<T> {
    pub fn with_adapter(endpoint: Arc<dyn Endpoint>, adapter: Arc<dyn Adapter<T>>) -> Self {
        let keys = KeyBuilder::new(endpoint.path());
        Self {
            endpoint,
            adapter,
            keys,
        }
    }

    /// Send filter `field` under parameter `param`.
    pub fn alias(mut self, field: impl Into<String>, param: impl Into<String>) -> Self {
        self.keys = self.keys.alias(field, param);
        self
    }

    pub fn path(&self) -> &str {
        self.endpoint.path()
    }

    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    pub fn endpoint(&self) -> &Arc<dyn Endpoint> {
        &self.endpoint
    }

    /// Cache fetcher: endpoint call followed by the adapter.
    pub fn fetcher(&self) -> Fetcher<ListPage<T>> {
        let endpoint = Arc::clone(&self.endpoint);
        let adapter = Arc::clone(&self.adapter);
        Arc::new(move |key: QueryKey| {
            let request = endpoint.fetch(&key);
            let adapter = Arc::clone(&adapter);
            async move {
                let raw = request.await?;
                adapter.adapt(key.endpoint(), raw)
            }
            .boxed()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Department {
        id: u32,
        name: String,
    }

    #[test]
    fn envelope_adapter_handles_both_shapes() {
        let adapter = EnvelopeAdapter::<Department>::new();

        let paged = adapter
            .adapt(
                "api/departments",
                json!({ "items": [{ "id": 1, "name": "Finance" }], "totalItems": 9 }),
            )
            .unwrap();
        assert_eq!(paged.total, 9);
        assert_eq!(paged.items[0].name, "Finance");

        let bare = adapter
            .adapt("api/departments", json!([{ "id": 2, "name": "Legal" }]))
            .unwrap();
        assert_eq!(bare.total, 1);
        assert_eq!(bare.items, vec![Department { id: 2, name: "Legal".into() }]);
    }

    #[test]
    fn envelope_adapter_reports_endpoint_on_mismatch() {
        let adapter = EnvelopeAdapter::<Department>::new();
        let err = adapter
            .adapt("api/departments", json!({ "rows": [] }))
            .unwrap_err();
        match err {
            CoreError::Decode { endpoint, .. } => assert_eq!(endpoint, "api/departments"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn closure_adapter() {
        let adapter = |raw: Value| -> Result<ListPage<String>, CoreError> {
            let names = raw["data"]
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
                .unwrap_or_default();
            Ok(ListPage::new(names, 0))
        };
        let page = adapter.adapt("api/galleries", json!({ "data": ["a", "b"] })).unwrap();
        assert_eq!(page.items, vec!["a".to_owned(), "b".to_owned()]);
    }
}
