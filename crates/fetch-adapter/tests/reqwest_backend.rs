//! Integration tests for the reqwest fetch client using mockito

use std::sync::{Arc, Mutex};

use fetch_adapter::{
    Adapter, AdapterError, Blob, FormData, Params, RequestConfig, ResponseType, ReqwestFetch,
};
use mockito::Matcher;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestPayload {
    name: String,
    value: i32,
}

fn adapter() -> Adapter {
    Adapter::builder().fetch(ReqwestFetch::new()).build()
}

#[tokio::test]
async fn test_get_json() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/data")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": "hello"}"#)
        .create_async()
        .await;

    let config = RequestConfig::get("/api/data").base_url(server.url());
    let response = adapter().invoke(config).await.expect("Request should succeed");

    assert_eq!(response.status, 200);
    assert_eq!(response.status_text, "OK");
    assert_eq!(
        response.data.as_json(),
        Some(&json!({"success": true, "data": "hello"}))
    );
    assert_eq!(response.headers.get("Content-Type"), Some("application/json"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_json_body() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/submit")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"name": "test", "value": 42})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1}"#)
        .create_async()
        .await;

    let payload = TestPayload {
        name: "test".to_string(),
        value: 42,
    };
    let config = RequestConfig::post("/api/submit")
        .base_url(server.url())
        .data(serde_json::to_value(&payload).expect("Payload serializes"));
    let response = adapter().invoke(config).await.expect("Request should succeed");

    assert_eq!(response.status, 201);
    assert_eq!(response.data.as_json(), Some(&json!({"id": 1})));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_query_params() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "a b".into()),
            Matcher::UrlEncoded("tags[]".into(), "x".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let params = Params::new().with("q", "a b").with("tags", vec!["x"]);
    let config = RequestConfig::get(format!("{}/api/search", server.url())).params(params);
    adapter().invoke(config).await.expect("Request should succeed");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_text_body_content_type() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("PUT", "/api/note")
        .match_header("content-type", "text/plain;charset=UTF-8")
        .match_body("hello")
        .with_status(204)
        .create_async()
        .await;

    let config = RequestConfig::new(reqwest::Method::PUT, "/api/note")
        .base_url(server.url())
        .data("hello");
    let response = adapter().invoke(config).await.expect("Request should succeed");

    assert_eq!(response.status, 204);
    assert_eq!(response.data.as_json(), Some(&serde_json::Value::Null));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_multipart_upload() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/upload")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=.+$".to_string()),
        )
        .match_body(Matcher::Regex("name=\"title\"".to_string()))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let form = FormData::new().text("title", "report").blob(
        "file",
        Blob::file(b"col\n1".to_vec(), "report.csv").with_type("text/csv"),
    );
    let config = RequestConfig::post("/api/upload")
        .base_url(server.url())
        .header("Content-Type", "application/json")
        .data(form);
    adapter().invoke(config).await.expect("Request should succeed");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_rejects() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/server-error")
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let config = RequestConfig::get("/api/server-error")
        .base_url(server.url())
        .response_type(ResponseType::Text);
    let err = adapter()
        .invoke(config)
        .await
        .expect_err("500 should reject");

    assert_eq!(err.to_string(), "Request failed with status code 500");
    let response = err.response().expect("Rejected response");
    assert_eq!(response.status_text, "Internal Server Error");
    assert_eq!(response.data.as_text(), Some("Internal Server Error"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_download_progress() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/file")
        .with_status(200)
        .with_body("hello")
        .create_async()
        .await;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let config = RequestConfig::get("/api/file")
        .base_url(server.url())
        .response_type(ResponseType::ArrayBuffer)
        .on_download_progress(move |event| sink.lock().expect("events lock").push(event));
    let response = adapter().invoke(config).await.expect("Request should succeed");

    assert_eq!(response.data.as_bytes(), Some(&b"hello"[..]));
    let events = events.lock().expect("events lock");
    let first = events.first().expect("Initial progress event");
    assert_eq!(first.loaded, 0);
    let last = events.last().expect("Final progress event");
    assert_eq!(last.loaded, 5);
    assert_eq!(last.total, 5);
    assert!(last.length_computable);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let config = RequestConfig::get("http://127.0.0.1:1/unreachable");
    let err = adapter()
        .invoke(config)
        .await
        .expect_err("Connection should fail");

    assert_eq!(err.to_string(), "Network Error");
    assert!(matches!(err, AdapterError::Network { .. }));
    assert!(err.request().is_some());
}
