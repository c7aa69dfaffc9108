use axum::{routing::get, Json, Router};
use logitrack_core::Category;
use serde_json::{json, Value};

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

async fn health() -> Json<Value> {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.base_path).collect();
    Json(json!({ "status": "ok", "categories": categories }))
}
