use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Runtime settings, read from the environment after `.env` is loaded.
///
/// | Env Var              | Default                      |
/// |----------------------|------------------------------|
/// | `DATABASE_URL`       | `sqlite://data/videos.db`    |
/// | `SEED_PATH`          | `videos.json`                |
/// | `HOST`               | `0.0.0.0`                    |
/// | `PORT`               | `4000`                       |
/// | `THUMBNAIL_BASE_URL` | `https://picsum.photos/seed` |
/// | `QUERY_TIMEOUT_MS`   | `10000`                      |
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub seed_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub thumbnail_base_url: Url,
    pub query_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("PORT", "4000")
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let thumbnail_base_url = Url::parse(&var("THUMBNAIL_BASE_URL", "https://picsum.photos/seed"))
            .context("THUMBNAIL_BASE_URL must be an absolute URL")?;

        let query_timeout_ms = var("QUERY_TIMEOUT_MS", "10000")
            .parse::<u64>()
            .context("QUERY_TIMEOUT_MS must be a number of milliseconds")?;

        Ok(Self {
            database_url: var("DATABASE_URL", "sqlite://data/videos.db"),
            seed_path: PathBuf::from(var("SEED_PATH", "videos.json")),
            host: var("HOST", "0.0.0.0"),
            port,
            thumbnail_base_url,
            query_timeout: Duration::from_millis(query_timeout_ms),
        })
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip = self
            .host
            .parse()
            .with_context(|| format!("HOST '{}' is not a valid IP address", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
