use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use super::seed::SeedVideo;
use super::timeout_query;
use super::video_id::VideoId;
use crate::errors::AppError;

/// Upper bound on id-collision retries for a single create.
const MAX_ID_ATTEMPTS: usize = 64;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS videos (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        thumbnail_url TEXT NOT NULL,
        created_at TEXT NOT NULL,
        duration INTEGER NOT NULL DEFAULT 0 CHECK (duration >= 0),
        views INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
        tags TEXT NOT NULL DEFAULT '[]'
    )
"#;

const LIST_ASC: &str = r#"
    SELECT id, title, thumbnail_url, created_at, duration, views, tags
    FROM videos
    ORDER BY julianday(created_at) ASC, CAST(SUBSTR(id, 3) AS INTEGER) DESC
"#;

const LIST_DESC: &str = r#"
    SELECT id, title, thumbnail_url, created_at, duration, views, tags
    FROM videos
    ORDER BY julianday(created_at) DESC, CAST(SUBSTR(id, 3) AS INTEGER) DESC
"#;

const INSERT_VIDEO: &str = r#"
    INSERT INTO videos (id, title, thumbnail_url, created_at, duration, views, tags)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

const INSERT_NEW_VIDEO: &str = r#"
    INSERT INTO videos (id, title, thumbnail_url, created_at, duration, views, tags)
    VALUES (?, ?, ?, ?, 0, 0, ?)
    ON CONFLICT(id) DO NOTHING
    RETURNING id, title, thumbnail_url, created_at, duration, views, tags
"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub created_at: String,
    pub duration: i64,
    pub views: i64,
    pub tags: Vec<String>,
}

#[derive(Debug, FromRow)]
struct VideoRow {
    id: String,
    title: String,
    thumbnail_url: String,
    created_at: String,
    duration: i64,
    views: i64,
    tags: Option<String>,
}

impl TryFrom<VideoRow> for Video {
    type Error = AppError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        let tags = match row.tags.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(raw) => serde_json::from_str(raw).map_err(|e| {
                AppError::Unexpected(
                    anyhow::Error::new(e).context(format!("Corrupt tags column for video {}", row.id)),
                )
            })?,
        };

        Ok(Video {
            id: row.id,
            title: row.title,
            thumbnail_url: row.thumbnail_url,
            created_at: row.created_at,
            duration: row.duration,
            views: row.views,
            tags,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Ascending),
            "desc" => Ok(SortDirection::Descending),
            other => Err(AppError::Validation(format!(
                "Invalid sort parameter '{}': expected 'asc' or 'desc'",
                other
            ))),
        }
    }
}

/// A validated create request: trimmed non-empty title and tags.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    title: String,
    tags: Vec<String>,
}

impl NewVideo {
    pub fn new(title: Option<String>, tags: Option<Vec<String>>) -> Result<Self, AppError> {
        let title = title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Validation("title is required and must be a non-empty string".to_string())
            })?
            .to_string();

        let tags = tags
            .unwrap_or_default()
            .into_iter()
            .map(|tag| {
                let tag = tag.trim();
                if tag.is_empty() {
                    Err(AppError::Validation("tags must be non-empty strings".to_string()))
                } else {
                    Ok(tag.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { title, tags })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

fn encode_tags(tags: &[String]) -> Result<String, AppError> {
    serde_json::to_string(tags)
        .map_err(|e| AppError::Unexpected(anyhow::Error::new(e).context("Failed to encode tags")))
}

/// Append-only store of video records.
#[derive(Clone, Debug)]
pub struct VideoStore {
    pool: SqlitePool,
    thumbnail_base_url: Url,
    query_timeout: Duration,
}

impl VideoStore {
    pub fn new(pool: SqlitePool, thumbnail_base_url: Url, query_timeout: Duration) -> Self {
        Self {
            pool,
            thumbnail_base_url,
            query_timeout,
        }
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the `videos` table if absent. Idempotent.
    #[tracing::instrument(name = "Initialize video store", skip(self))]
    pub async fn initialize(&self) -> Result<(), AppError> {
        timeout_query(self.query_timeout, sqlx::query(CREATE_TABLE).execute(&self.pool)).await?;
        tracing::info!("videos table ready");
        Ok(())
    }

    /// Inserts the whole dataset in one transaction when the table is empty.
    /// Returns the number of inserted rows.
    #[tracing::instrument(name = "Seed video store", skip(self, videos), fields(dataset = videos.len()))]
    pub async fn seed_if_empty(&self, videos: &[SeedVideo]) -> Result<u64, AppError> {
        let encoded = videos
            .iter()
            .map(|v| encode_tags(&v.tags))
            .collect::<Result<Vec<_>, _>>()?;

        let inserted = timeout_query(self.query_timeout, async {
            let mut tx = self.pool.begin().await?;

            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
                .fetch_one(&mut *tx)
                .await?;
            if count > 0 {
                return Ok::<u64, sqlx::Error>(0);
            }

            let mut inserted = 0;
            for (video, tags) in videos.iter().zip(&encoded) {
                inserted += sqlx::query(INSERT_VIDEO)
                    .bind(&video.id)
                    .bind(&video.title)
                    .bind(&video.thumbnail_url)
                    .bind(&video.created_at)
                    .bind(video.duration)
                    .bind(video.views)
                    .bind(tags)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
            }

            tx.commit().await?;
            Ok::<u64, sqlx::Error>(inserted)
        })
        .await?;

        if inserted > 0 {
            tracing::info!(inserted, "Seeded videos table");
        } else {
            tracing::debug!("videos table already populated, skipping seed");
        }
        Ok(inserted)
    }

    #[tracing::instrument(name = "List videos", skip(self))]
    pub async fn list(&self, direction: SortDirection) -> Result<Vec<Video>, AppError> {
        let sql = match direction {
            SortDirection::Ascending => LIST_ASC,
            SortDirection::Descending => LIST_DESC,
        };

        let rows = timeout_query(
            self.query_timeout,
            sqlx::query_as::<_, VideoRow>(sql).fetch_all(&self.pool),
        )
        .await?;

        tracing::debug!(count = rows.len(), "Fetched videos");
        rows.into_iter().map(Video::try_from).collect()
    }

    /// Inserts a new video under the next free id.
    ///
    /// The insert is skipped when another writer claimed the id first, in
    /// which case the id is recomputed and the insert retried.
    #[tracing::instrument(name = "Create video", skip(self, new_video), fields(title = %new_video.title()))]
    pub async fn create(&self, new_video: NewVideo) -> Result<Video, AppError> {
        let tags = encode_tags(new_video.tags())?;

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = VideoId::after(self.current_max_id().await?).to_string();
            let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

            let row = timeout_query(
                self.query_timeout,
                sqlx::query_as::<_, VideoRow>(INSERT_NEW_VIDEO)
                    .bind(&id)
                    .bind(new_video.title())
                    .bind(self.thumbnail_url(&id))
                    .bind(&created_at)
                    .bind(&tags)
                    .fetch_optional(&self.pool),
            )
            .await?;

            match row {
                Some(row) => {
                    tracing::info!(id = %row.id, "Created video");
                    return Video::try_from(row);
                }
                None => tracing::warn!(%id, attempt, "Video id already taken, retrying"),
            }
        }

        Err(AppError::Unexpected(anyhow::anyhow!(
            "Could not allocate a video id after {} attempts",
            MAX_ID_ATTEMPTS
        )))
    }

    async fn current_max_id(&self) -> Result<Option<VideoId>, AppError> {
        let max = timeout_query(
            self.query_timeout,
            sqlx::query_scalar::<_, String>(
                r#"SELECT id FROM videos
                   WHERE id GLOB 'v-[0-9]*'
                   ORDER BY CAST(SUBSTR(id, 3) AS INTEGER) DESC
                   LIMIT 1"#,
            )
            .fetch_optional(&self.pool),
        )
        .await?;

        max.map(|id| id.parse::<VideoId>())
            .transpose()
            .map_err(|e| AppError::Unexpected(anyhow::Error::new(e)))
    }

    fn thumbnail_url(&self, id: &str) -> String {
        format!(
            "{}/{}/320/180",
            self.thumbnail_base_url.as_str().trim_end_matches('/'),
            id
        )
    }
}
