//! Static dataset loaded into an empty library on first run.

use anyhow::{bail, Context};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use url::Url;

use super::video_id::VideoId;

#[derive(Debug, Deserialize)]
struct SeedFile {
    videos: Vec<SeedVideo>,
}

/// One entry of the seed dataset; optional counters and tags take their defaults.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SeedVideo {
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub created_at: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SeedVideo {
    /// Checks the entry and rewrites `created_at` to canonical UTC so stored
    /// timestamps always compare in SQLite.
    fn validate(&mut self) -> anyhow::Result<()> {
        self.id.parse::<VideoId>()?;

        if self.title.trim().is_empty() {
            bail!("title is empty");
        }
        Url::parse(&self.thumbnail_url)
            .with_context(|| format!("thumbnail_url '{}' is not a valid URL", self.thumbnail_url))?;

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("created_at '{}' is not RFC 3339", self.created_at))?;
        self.created_at = created_at
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        if self.duration < 0 {
            bail!("duration {} is negative", self.duration);
        }
        if self.views < 0 {
            bail!("views {} is negative", self.views);
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            bail!("tags contain an empty entry");
        }
        Ok(())
    }
}

/// Parses and validates a `{"videos": [...]}` document.
pub fn parse_seed(raw: &str) -> anyhow::Result<Vec<SeedVideo>> {
    let mut file: SeedFile = serde_json::from_str(raw).context("Seed data is not valid JSON")?;

    let mut seen = HashSet::new();
    for (index, video) in file.videos.iter_mut().enumerate() {
        let id = video.id.clone();
        video
            .validate()
            .with_context(|| format!("Invalid seed entry #{} ({})", index, id))?;
        if !seen.insert(id) {
            bail!("Duplicate seed id {}", video.id);
        }
    }

    Ok(file.videos)
}

#[tracing::instrument(name = "load_seed_file")]
pub async fn load_seed_file(path: &Path) -> anyhow::Result<Vec<SeedVideo>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;

    let videos = parse_seed(&raw).with_context(|| format!("Seed file {}", path.display()))?;
    tracing::debug!(count = videos.len(), "Loaded seed dataset");
    Ok(videos)
}
