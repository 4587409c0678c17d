// In-memory endpoint shared by the accumulator and controller tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use crate::error::CoreError;
use crate::query::{PAGE_NUMBER_PARAM, PAGE_SIZE_PARAM, QueryKey};
use crate::resource::Endpoint;

struct Inner {
    rows: Mutex<Vec<Value>>,
    requests: Mutex<Vec<QueryKey>>,
    fail_page: Mutex<Option<u32>>,
    held: AtomicBool,
    gate: Semaphore,
}

/// Serves `{ items, totalItems }` pages out of a row vector. Rows are
/// `{ "id": .., "name": .. }`; the `SearchTerm` parameter filters names.
#[derive(Clone)]
pub(crate) struct MockEndpoint {
    path: String,
    inner: Arc<Inner>,
}

impl MockEndpoint {
    pub(crate) fn new(path: &str, count: usize) -> Self {
        let rows = (1..=count)
            .map(|i| json!({ "id": i.to_string(), "name": format!("row {i}") }))
            .collect();
        Self {
            path: path.to_owned(),
            inner: Arc::new(Inner {
                rows: Mutex::new(rows),
                requests: Mutex::new(Vec::new()),
                fail_page: Mutex::new(None),
                held: AtomicBool::new(false),
                gate: Semaphore::new(0),
            }),
        }
    }

    pub(crate) fn requests(&self) -> Vec<QueryKey> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub(crate) fn requested_pages(&self) -> Vec<u32> {
        self.requests()
            .iter()
            .filter_map(|k| k.get(PAGE_NUMBER_PARAM)?.parse().ok())
            .collect()
    }

    pub(crate) fn fail_on_page(&self, page: Option<u32>) {
        *self.inner.fail_page.lock().unwrap() = page;
    }

    /// Block fetches until [`release`](Self::release) hands out permits.
    pub(crate) fn hold(&self) {
        self.inner.held.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release(&self, n: usize) {
        self.inner.gate.add_permits(n);
    }

    fn page(inner: &Inner, key: &QueryKey) -> Result<Value, CoreError> {
        let number: usize = key
            .get(PAGE_NUMBER_PARAM)
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        let size: usize = key
            .get(PAGE_SIZE_PARAM)
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        if *inner.fail_page.lock().unwrap() == Some(u32::try_from(number).unwrap()) {
            return Err(CoreError::Server {
                message: "page unavailable".into(),
                status: Some(503),
            });
        }

        let rows = inner.rows.lock().unwrap();
        let matching: Vec<&Value> = rows
            .iter()
            .filter(|row| {
                key.get("SearchTerm").is_none_or(|term| {
                    row["name"].as_str().is_some_and(|name| name.contains(term))
                })
            })
            .collect();
        let items: Vec<&Value> = matching
            .iter()
            .skip((number - 1) * size)
            .take(size)
            .copied()
            .collect();
        Ok(json!({ "items": items, "totalItems": matching.len() }))
    }
}

impl Endpoint for MockEndpoint {
    fn path(&self) -> &str {
        &self.path
    }

    fn fetch(&self, key: &QueryKey) -> BoxFuture<'static, Result<Value, CoreError>> {
        self.inner.requests.lock().unwrap().push(key.clone());
        let inner = Arc::clone(&self.inner);
        let key = key.clone();
        async move {
            if inner.held.load(Ordering::SeqCst) {
                inner
                    .gate
                    .acquire()
                    .await
                    .map_err(|_| CoreError::Timeout)?
                    .forget();
            }
            Self::page(&inner, &key)
        }
        .boxed()
    }

    fn create(&self, body: Value) -> BoxFuture<'static, Result<Option<Value>, CoreError>> {
        let inner = Arc::clone(&self.inner);
        async move {
            if body["name"].as_str().is_none_or(str::is_empty) {
                return Err(CoreError::ValidationFailed {
                    message: "Name is required".into(),
                    fields: vec![("name".into(), "required".into())],
                });
            }
            inner.rows.lock().unwrap().push(body.clone());
            Ok(Some(body))
        }
        .boxed()
    }

    fn update(&self, id: &str, body: Value) -> BoxFuture<'static, Result<Option<Value>, CoreError>> {
        let inner = Arc::clone(&self.inner);
        let id = id.to_owned();
        async move {
            let mut rows = inner.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|row| row["id"] == id.as_str())
                .ok_or_else(|| CoreError::NotFound { path: id.clone() })?;
            *row = body;
            Ok(None)
        }
        .boxed()
    }

    fn delete(&self, id: &str) -> BoxFuture<'static, Result<(), CoreError>> {
        let inner = Arc::clone(&self.inner);
        let id = id.to_owned();
        async move {
            inner.rows.lock().unwrap().retain(|row| row["id"] != id.as_str());
            Ok(())
        }
        .boxed()
    }
}
