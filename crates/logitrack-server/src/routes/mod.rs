pub mod health;
pub mod records;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::faults::{fault_middleware, Faults};
use crate::table::RecordTables;

pub struct InnerAppState {
    pub tables: RecordTables,
    pub faults: Faults,
}

pub type AppState = Arc<InnerAppState>;

pub fn new_state() -> AppState {
    Arc::new(InnerAppState {
        tables: RecordTables::new(),
        faults: Faults::default(),
    })
}

pub fn build_router(state: AppState) -> Router {
    let public = Router::new().merge(health::routes());

    let api = Router::new()
        .merge(records::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            fault_middleware,
        ));

    public
        .merge(api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub type ApiError = (StatusCode, Json<Value>);

pub fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": msg.into() })))
}
