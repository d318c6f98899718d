// routes.rs
use axum::{routing::get, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

async fn root() -> &'static str {
    "Support bot is running!"
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
}
