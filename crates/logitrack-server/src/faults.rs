use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::routes::AppState;

/// A canned failure returned instead of handling a request.
#[derive(Debug, Clone)]
pub struct Fault {
    pub status: StatusCode,
    pub body: Value,
}

/// Injected misbehaviour, used by integration tests to reproduce backend
/// failures and slow responses.
#[derive(Debug, Default)]
pub struct Faults {
    pending: Mutex<VecDeque<Fault>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl Faults {
    /// Fail the next API request (health checks excluded) with `fault`.
    pub fn push(&self, fault: Fault) {
        lock(&self.pending).push_back(fault);
    }

    fn take(&self) -> Option<Fault> {
        lock(&self.pending).pop_front()
    }

    /// Hold writes that submit `name` for `delay` before applying them.
    pub fn delay_name(&self, name: &str, delay: Duration) {
        lock(&self.delays).insert(name.to_string(), delay);
    }

    pub fn delay_for(&self, name: Option<&str>) -> Option<Duration> {
        let name = name?;
        lock(&self.delays).get(name).copied()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub async fn fault_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match state.faults.take() {
        Some(fault) => {
            tracing::debug!(
                "injected {} for {} {}",
                fault.status,
                request.method(),
                request.uri()
            );
            (fault.status, Json(fault.body)).into_response()
        }
        None => next.run(request).await,
    }
}
