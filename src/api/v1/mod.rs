//! Version 1 endpoints for the video library.

pub mod videos;

use axum::routing::get;
use axum::Router;

use crate::InnerState;

#[tracing::instrument(name = "create_v1_router", skip(state))]
pub fn create_v1_router(state: InnerState) -> Router<InnerState> {
    tracing::info!("Creating V1 API router");

    Router::new()
        .route(
            "/api/videos",
            get(videos::list_videos).post(videos::create_video),
        )
        .with_state(state)
}
