//! HTTP surface of the video library.
//!
//! Endpoints are grouped by version; `create_app` assembles them together
//! with the system routes and the shared middleware stack.

pub mod common;
pub mod v1;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::system::create_system_router;
use crate::InnerState;
use common::tracing::{make_custom_span, on_custom_failure, on_custom_request, on_custom_response};

/// Builds the application router with CORS and request tracing applied.
#[tracing::instrument(name = "create_app", skip(state))]
pub fn create_app(state: InnerState) -> Router {
    tracing::info!("Creating application router");

    Router::new()
        .merge(create_system_router())
        .merge(v1::create_v1_router(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_custom_span)
                .on_request(on_custom_request)
                .on_response(on_custom_response)
                .on_failure(on_custom_failure),
        )
        .with_state(state)
}
