// Integration tests for `ApiClient` using wiremock.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use staffdesk_api::{ApiClient, Error, RawListResponse};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_get_list_sends_query_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .and(query_param("PageNumber", "2"))
        .and(query_param("PageSize", "10"))
        .and(query_param("SearchTerm", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": 11, "name": "Abc Def" }],
            "totalItems": 11
        })))
        .expect(1)
        .mount(&server)
        .await;

    let raw = client
        .get_list(
            "api/employees",
            &params(&[("PageNumber", "2"), ("PageSize", "10"), ("SearchTerm", "abc")]),
        )
        .await
        .unwrap();

    let decoded: RawListResponse<serde_json::Value> = serde_json::from_value(raw).unwrap();
    let (items, total) = decoded.into_parts();
    assert_eq!(total, 11);
    assert_eq!(items[0]["name"], "Abc Def");
}

#[tokio::test]
async fn test_get_list_bare_array() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Finance" },
            { "id": 2, "name": "Legal" }
        ])))
        .mount(&server)
        .await;

    let decoded: RawListResponse<serde_json::Value> = client
        .get_with_params("api/departments", &[])
        .await
        .unwrap();
    let (items, total) = decoded.into_parts();
    assert_eq!(total, 2);
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_create_returns_entity() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/positions"))
        .and(body_json(json!({ "title": "Archivist" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7, "title": "Archivist" })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create("api/positions", &json!({ "title": "Archivist" }))
        .await
        .unwrap();
    assert_eq!(created, Some(json!({ "id": 7, "title": "Archivist" })));
}

#[tokio::test]
async fn test_update_with_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/positions/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client
        .update("api/positions", "7", &json!({ "title": "Senior Archivist" }))
        .await
        .unwrap();
    assert_eq!(updated, None);
}

#[tokio::test]
async fn test_delete() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/news/3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.delete("api/news", "3").await.unwrap();
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_validation_error_carries_message_and_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/employees"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Employee code already in use",
            "errors": { "Code": ["Duplicate"] }
        })))
        .mount(&server)
        .await;

    let err = client
        .create("api/employees", &json!({ "code": "E-1" }))
        .await
        .unwrap_err();

    match err {
        Error::Validation { message, fields } => {
            assert_eq!(message, "Employee code already in use");
            assert_eq!(fields, vec![("Code".to_owned(), "Duplicate".to_owned())]);
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/files"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.get_list("api/files", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized { .. }));
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/galleries/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.delete("api/galleries", "99").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_server_error_plain_text() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/schedules"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.get_list("api/schedules", &[]).await.unwrap_err();
    match &err {
        Error::Server { status, message } => {
            assert_eq!(*status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Server, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client.get_list("api/documents", &[]).await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>"),
        other => panic!("expected Deserialization, got {other:?}"),
    }
}
