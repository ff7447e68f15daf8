mod api;
mod config;
mod db;
mod errors;
mod store;
mod system;

use std::path::Path;

use anyhow::Context;
use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Settings;
use crate::db::init_db;
use crate::store::{load_seed_file, VideoStore};

#[derive(Clone)]
pub struct InnerState {
    pub store: VideoStore,
}

/// Loads the seed dataset into an empty store. A missing file only warns.
async fn seed_store(store: &VideoStore, seed_path: &Path) -> anyhow::Result<()> {
    let exists = tokio::fs::try_exists(seed_path)
        .await
        .with_context(|| format!("Failed to check seed file {}", seed_path.display()))?;
    if !exists {
        tracing::warn!(path = %seed_path.display(), "Seed file not found, skipping seed");
        return Ok(());
    }

    let videos = load_seed_file(seed_path).await?;
    let inserted = store
        .seed_if_empty(&videos)
        .await
        .context("Failed to seed videos table")?;
    tracing::info!(inserted, path = %seed_path.display(), "Seed check complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "video_library_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    let db = init_db(&settings.database_url).await?;
    let store = VideoStore::new(
        db,
        settings.thumbnail_base_url.clone(),
        settings.query_timeout,
    );
    store
        .initialize()
        .await
        .context("Failed to create videos table")?;
    seed_store(&store, &settings.seed_path).await?;

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = api::create_app(InnerState { store })
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer);

    let addr = settings.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Could not bind {}", addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
