//! Configuration loading for runscripts
//!
//! One TOML file, by default `<config dir>/runscripts/config.toml`, chosen
//! with `--config` or `RUN_CONFIG`. Running without a file is normal: every
//! section has defaults, so a fresh install resolves scripts from the
//! built-in sources into the per-user data directory.

pub mod schema;

pub use schema::{Config, FetchConfig, GeneralConfig, LockConfig, SourcesConfig, DEFAULT_SCOPE};

use crate::error::{RunError, RunResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Locates, reads and writes the config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the per-user config file
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Manager for an explicit `--config` path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// `<config dir>/runscripts/config.toml`, or `./runscripts/config.toml`
    /// when the platform has no config dir
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("runscripts")
            .join("config.toml")
    }

    /// Read the config file
    ///
    /// A missing file yields `Config::default()`. A file that exists but does
    /// not parse is a `ConfigInvalid` error naming the path; it is never
    /// silently replaced by defaults.
    pub async fn load(&self) -> RunResult<Config> {
        if !self.config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path).await.map_err(|e| {
            RunError::io(
                format!("reading config from {}", self.config_path.display()),
                e,
            )
        })?;

        toml::from_str(&content).map_err(|e| RunError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write `content` verbatim, creating the parent directory
    ///
    /// `--init` uses this to keep the template's comments, which a
    /// serialize round trip would drop.
    pub async fn write_raw(&self, content: &str) -> RunResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RunError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        fs::write(&self.config_path, content).await.map_err(|e| {
            RunError::io(format!("writing config to {}", self.config_path.display()), e)
        })?;

        info!("Wrote config {}", self.config_path.display());
        Ok(())
    }

    /// Create `general.data_dir`, the root of the script cache
    pub async fn ensure_data_dir(config: &Config) -> RunResult<()> {
        let dir = &config.general.data_dir;
        fs::create_dir_all(dir)
            .await
            .map_err(|e| RunError::DirectoryCreateFailed {
                path: dir.clone(),
                source: e,
            })
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
