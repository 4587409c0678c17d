// End-to-end tests: controllers and accumulators over the HTTP endpoint,
// against a wiremock server.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use staffdesk_api::ApiClient;
use staffdesk_core::{Console, ConsoleConfig, CoreError, ErrorKind, FilterState, SortSpec};

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct Employee {
    id: u32,
    name: String,
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Console) {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    let config = ConsoleConfig::new(server.uri().parse().unwrap());
    (server, Console::with_client(client, config))
}

fn employees(range: std::ops::RangeInclusive<u32>) -> Vec<serde_json::Value> {
    range
        .map(|i| json!({ "id": i, "name": format!("Employee {i}") }))
        .collect()
}

// ── Controller ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_controller_sends_canonical_params() {
    let (server, console) = setup().await;

    // Mounted first so it wins over the unfiltered page below.
    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .and(query_param("PageNumber", "1"))
        .and(query_param("SearchTerm", "ann"))
        .and(query_param("Sort", "name,desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": 4, "name": "Anna" }],
            "totalItems": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .and(query_param("PageNumber", "1"))
        .and(query_param("PageSize", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": employees(1..=10),
            "totalItems": 23
        })))
        .mount(&server)
        .await;

    let mut list = console.controller(console.resource::<Employee>("api/employees"));
    let view = list.settled().await;
    assert_eq!(view.items().len(), 10);
    assert_eq!(view.total(), 23);
    assert_eq!(view.page.as_ref().unwrap().page_count(10), 3);

    list.set_sort(Some(SortSpec::desc("name")));
    list.set_filter(FilterState::new().with("Search", "  ann "));
    let view = list.settled().await;
    assert_eq!(
        view.items(),
        &[Employee {
            id: 4,
            name: "Anna".into()
        }]
    );
}

#[tokio::test]
async fn test_controller_reads_bare_arrays() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Finance" },
            { "id": 2, "name": "Legal" }
        ])))
        .mount(&server)
        .await;

    let mut departments = console.controller(console.resource::<Employee>("api/departments"));
    let view = departments.settled().await;
    assert_eq!(view.total(), 2);
    assert_eq!(view.items()[1].name, "Legal");
}

#[tokio::test]
async fn test_create_refreshes_list() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": employees(1..=2),
            "totalItems": 2
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": employees(1..=3),
            "totalItems": 3
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/employees"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": 3, "name": "Employee 3" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut list = console.controller(console.resource::<Employee>("api/employees"));
    assert_eq!(list.settled().await.total(), 2);

    let created = list
        .create(json!({ "name": "Employee 3" }))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created["id"], 3);
    assert!(list.view().is_validating);

    let view = list.settled().await;
    assert!(!view.is_validating);
    assert_eq!(view.total(), 3);
}

#[tokio::test]
async fn test_gateway_refreshes_every_page_of_endpoint() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": employees(1..=2),
            "totalItems": 12
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": employees(1..=2),
            "totalItems": 13
        })))
        .expect(2)
        .mount(&server)
        .await;

    let resource = console.resource::<Employee>("api/employees");
    let mut first = console.controller(resource.clone());
    let mut second = console.controller(resource);
    second.set_page(1);
    assert_eq!(first.settled().await.total(), 12);
    assert_eq!(second.settled().await.total(), 12);

    let pending = console
        .gateway::<Employee>()
        .invalidate_endpoint("api/employees");
    assert_eq!(pending.len(), 2);
    for refetch in pending {
        refetch.await.unwrap();
    }

    assert_eq!(first.view().total(), 13);
    assert_eq!(second.view().total(), 13);
}

#[tokio::test]
async fn test_failed_mutation_surfaces_validation_message() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/employees/7"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Email already in use",
            "errors": { "Email": ["Duplicate"] }
        })))
        .mount(&server)
        .await;

    let mut list = console.controller(console.resource::<Employee>("api/employees"));
    list.settled().await;

    let err = list.update("7", json!({ "email": "a@b.c" })).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.user_message(), "Email already in use");
    assert!(!list.view().is_validating);
}

#[tokio::test]
async fn test_fetch_error_is_exposed_on_view() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&server)
        .await;

    let mut list = console.controller(console.resource::<Employee>("api/employees"));
    let view = list.settled().await;
    assert!(view.page.is_none());
    assert!(!view.is_loading);
    match view.error.as_deref() {
        Some(CoreError::Server { status, .. }) => assert_eq!(*status, Some(500)),
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_decode_error_names_endpoint() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rows": 1 })))
        .mount(&server)
        .await;

    let mut list = console.controller(console.resource::<Employee>("api/employees"));
    let view = list.settled().await;
    match view.error.as_deref() {
        Some(CoreError::Decode { endpoint, .. }) => assert_eq!(endpoint, "api/employees"),
        other => panic!("expected decode error, got {other:?}"),
    }
}

// ── Accumulator ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_accumulator_walks_until_short_page() {
    let (server, console) = setup().await;

    for (page, range) in [("1", 1..=50), ("2", 51..=100), ("3", 101..=137)] {
        Mock::given(method("GET"))
            .and(path("/api/positions"))
            .and(query_param("PageNumber", page))
            .and(query_param("PageSize", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": employees(range),
                "totalItems": 137
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/api/positions"))
        .and(query_param("PageNumber", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let positions = console.accumulator(console.resource::<Employee>("api/positions"));
    let view = positions.run().await;
    assert_eq!(view.items.len(), 137);
    assert!(!view.is_loading);
    assert_eq!(view.items.last().unwrap().id, 137);
}

#[tokio::test]
async fn test_accumulator_error_keeps_prefix() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/positions"))
        .and(query_param("PageNumber", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": employees(1..=50),
            "totalItems": 120
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/positions"))
        .and(query_param("PageNumber", "2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let positions = console.accumulator(console.resource::<Employee>("api/positions"));
    let view = positions.run().await;
    assert_eq!(view.items.len(), 50);
    let err = view.error.unwrap();
    assert_eq!(err.kind(), ErrorKind::Accumulator);
    assert_eq!(err.to_string(), "Failed to load page 2 of api/positions");
}
