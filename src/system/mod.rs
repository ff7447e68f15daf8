//! System-level routes: liveness message and health probe.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::InnerState;

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Video Library API is running." }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[tracing::instrument(name = "create_system_router")]
pub fn create_system_router() -> Router<InnerState> {
    tracing::info!("Creating system router");

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
