use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;

use crate::faults::Fault;
use crate::routes::{build_router, new_state, AppState};

/// Build a test router over empty in-memory tables.
pub fn test_router() -> (Router, AppState) {
    let state = new_state();
    (build_router(state.clone()), state)
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Answer the next API request with `status` and `{"error": message}`.
    pub fn fail_next(&self, status: u16, message: &str) {
        self.push_fault(status, json!({ "error": message }));
    }

    /// Answer the next API request with `status` and `{"message": message}`.
    pub fn fail_next_with_message(&self, status: u16, message: &str) {
        self.push_fault(status, json!({ "message": message }));
    }

    fn push_fault(&self, status: u16, body: serde_json::Value) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.state.faults.push(Fault { status, body });
    }

    /// Hold writes that submit this name (or excel uploads with this file
    /// name) for `delay` before applying them.
    pub fn delay_name(&self, name: &str, delay: Duration) {
        self.state.faults.delay_name(name, delay);
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Spawn an axum test server on a random port. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let (app, state) = test_router();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        state,
        _handle: handle,
    }
}
