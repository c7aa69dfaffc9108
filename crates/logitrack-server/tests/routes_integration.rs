//! Router-level tests: requests go through the full axum stack in-process.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use logitrack_server::test_helpers::test_router;
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "logitrack-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file_data\"; filename=\"{filename}\"\r\nContent-Type: application/vnd.openxmlformats-officedocument.spreadsheetml.sheet\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn form_request(method: &str, uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart(parts)))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_lists_collections() {
    let (app, _) = test_router();
    let (status, body) = call(&app, empty_request("GET", "/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["categories"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn create_list_update_delete() {
    let (app, _) = test_router();
    let (status, created) = call(
        &app,
        form_request(
            "POST",
            "/api/shipments",
            &[
                Part::Text("name", "R1"),
                Part::Text("description", "first"),
                Part::Text("status", "incomplete"),
                Part::Text("createdBy", "ops"),
                Part::File("a.xlsx", &[80, 75, 3, 4]),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["file_name"], "a.xlsx");
    assert_eq!(created["file_data"]["data"], serde_json::json!([80, 75, 3, 4]));
    let id = created["id"].as_u64().unwrap();

    let (_, list) = call(&app, empty_request("GET", "/api/shipments")).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    let (_, other) = call(&app, empty_request("GET", "/api/customers")).await;
    assert!(other.as_array().unwrap().is_empty());

    let (status, updated) = call(
        &app,
        form_request(
            "PUT",
            &format!("/api/shipments/{id}"),
            &[Part::Text("name", "R1b"), Part::Text("status", "completed")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "R1b");
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["file_name"], "a.xlsx");

    let (status, _) = call(&app, empty_request("DELETE", &format!("/api/shipments/{id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = call(&app, empty_request("DELETE", &format!("/api/shipments/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "record not found");
}

#[tokio::test]
async fn required_attachment_is_enforced_per_category() {
    let (app, _) = test_router();
    let fields = [Part::Text("name", "x"), Part::Text("createdBy", "ops")];

    let (status, body) = call(&app, form_request("POST", "/api/item-snapshots", &fields)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "file_data is required");

    let (status, body) = call(&app, form_request("POST", "/api/summary", &fields)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["file_data"].is_null());
}

#[tokio::test]
async fn excel_upload_replaces_attachment() {
    let (app, _) = test_router();
    let (_, created) = call(
        &app,
        form_request("POST", "/api/customers", &[Part::Text("name", "c")]),
    )
    .await;
    let id = created["id"].as_u64().unwrap();

    let (status, body) = call(
        &app,
        form_request("PUT", &format!("/api/customers/{id}/excel"), &[]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Excel file is required");

    let (status, body) = call(
        &app,
        form_request(
            "PUT",
            &format!("/api/customers/{id}/excel"),
            &[Part::Text("file_name", "renamed.xlsx"), Part::File("upload.xlsx", b"PK")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_name"], "renamed.xlsx");
    assert_eq!(body["file_data"]["data"], serde_json::json!([80, 75]));
    assert_eq!(body["name"], "c");
}

#[tokio::test]
async fn unknown_collection_and_bad_status() {
    let (app, _) = test_router();
    let (status, _) = call(&app, empty_request("GET", "/api/vehicles")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        form_request(
            "POST",
            "/api/summary",
            &[Part::Text("name", "s"), Part::Text("status", "archived")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid status: archived");
}

#[tokio::test]
async fn injected_fault_answers_one_request() {
    let (app, state) = test_router();
    state.faults.push(logitrack_server::faults::Fault {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: serde_json::json!({ "error": "maintenance" }),
    });

    let (status, _) = call(&app, empty_request("GET", "/api/health")).await;
    assert_eq!(status, StatusCode::OK, "health bypasses faults");

    let (status, body) = call(&app, empty_request("GET", "/api/summary")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "maintenance");

    let (status, _) = call(&app, empty_request("GET", "/api/summary")).await;
    assert_eq!(status, StatusCode::OK);
}
