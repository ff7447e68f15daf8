//! SQLite-backed video library: schema, seed dataset, id scheme and queries.

pub mod seed;
pub mod video_id;
pub mod videos;

pub use seed::load_seed_file;
pub use videos::{NewVideo, SortDirection, Video, VideoStore};

use crate::errors::AppError;

/// Runs a query future under `duration`, mapping expiry to a database error.
pub async fn timeout_query<T, F>(duration: std::time::Duration, fut: F) -> Result<T, AppError>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(Ok(res)) => Ok(res),
        Ok(Err(e)) => Err(AppError::from(e)),
        Err(_) => Err(AppError::Database(anyhow::anyhow!(
            "Query timeout after {:?}",
            duration
        ))),
    }
}

#[cfg(test)]
pub(crate) async fn memory_store() -> VideoStore {
    let pool = crate::db::init_db("sqlite::memory:").await.unwrap();
    let store = VideoStore::new(
        pool,
        url::Url::parse("https://picsum.photos/seed").unwrap(),
        std::time::Duration::from_secs(5),
    );
    store.initialize().await.unwrap();
    store
}
