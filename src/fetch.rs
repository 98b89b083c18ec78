//! Remote script retrieval
//!
//! A [`Fetcher`] writes the content behind a URL to a destination path.
//! Content lands in a temporary file beside the destination and is renamed
//! into place, so readers see either the old file, no file, or the complete
//! new one.

use crate::config::FetchConfig;
use crate::error::{RunError, RunResult};
use async_trait::async_trait;
use std::fs::{self, Permissions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Mode given to fetched scripts so they can run directly
const SCRIPT_MODE: u32 = 0o755;

/// Retrieves remote content into a local file
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` into `dest`, replacing it only on success
    async fn fetch(&self, url: &str, dest: &Path) -> RunResult<()>;
}

/// Fetcher for `http://`, `https://` and `file://` URLs
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpFetcher {
    /// Create a fetcher from configuration
    pub fn new(config: &FetchConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(config.timeout())
            .build()
            .into();

        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }

    fn download(&self, url: &str) -> RunResult<Vec<u8>> {
        if let Some(path) = url.strip_prefix("file://") {
            return fs::read(path).map_err(|e| RunError::fetch_failed(url, e));
        }

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RunError::fetch_failed(url, "unsupported URL scheme"));
        }

        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .map_err(|e| RunError::fetch_failed(url, e))?;

        response
            .body_mut()
            .read_to_vec()
            .map_err(|e| RunError::fetch_failed(url, e))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> RunResult<()> {
        info!("Fetching {}", url);

        let fetcher = self.clone();
        let url = url.to_string();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let body = fetcher.download(&url)?;
            debug!("Downloaded {} bytes from {}", body.len(), url);
            write_atomically(&dest, &body)
                .map_err(|e| RunError::fetch_failed(&url, format!("writing {}: {}", dest.display(), e)))
        })
        .await
        .map_err(|e| RunError::Internal(format!("fetch task failed: {}", e)))?
    }
}

/// Write `content` to a sibling temp file, mark it executable, rename over `dest`
fn write_atomically(dest: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = dest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.as_file()
        .set_permissions(Permissions::from_mode(SCRIPT_MODE))?;
    temp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}
