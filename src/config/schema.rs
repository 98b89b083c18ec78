//! Configuration schema for runscripts
//!
//! Configuration is stored at `~/.config/runscripts/config.toml`

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Scope used when a reference has no `scope:` prefix
pub const DEFAULT_SCOPE: &str = "default";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache slot locking
    pub lock: LockConfig,

    /// Remote fetch settings
    pub fetch: FetchConfig,

    /// Scope to URL template mapping
    pub sources: SourcesConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Base directory holding cached scripts
    pub data_dir: PathBuf,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Scope assumed when a reference has none
    pub default_scope: String,

    /// Git ref substituted for `{ref}` when a reference has no `@ref`
    pub default_ref: String,
}

impl GeneralConfig {
    /// Default data directory (`~/.local/share/runscripts` on Linux)
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("runscripts")
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            log_format: "text".to_string(),
            default_scope: DEFAULT_SCOPE.to_string(),
            default_ref: "master".to_string(),
        }
    }
}

/// Cache slot lock settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Suffix appended to the slot directory to name its lock file
    pub suffix: String,

    /// Seconds to wait for a lock (0 = wait forever)
    pub timeout_secs: u64,
}

impl LockConfig {
    /// Lock wait bound, `None` meaning unbounded
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            suffix: ".lock".to_string(),
            timeout_secs: 0,
        }
    }
}

/// Remote fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Overall request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,

    /// User-Agent header sent with requests
    pub user_agent: String,
}

impl FetchConfig {
    /// Request timeout, `None` meaning unbounded
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("runscripts/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Scope to URL template mapping
///
/// Templates may use `{script}`, `{ref}`, and the `owner/repo/path` split
/// placeholders `{owner}`, `{repo}` and `{path}`. User entries are merged
/// over the built-in scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SourcesConfig(BTreeMap<String, String>);

impl SourcesConfig {
    /// Built-in scopes
    pub fn builtin() -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                DEFAULT_SCOPE.to_string(),
                "https://raw.githubusercontent.com/runscripts/scripts/{ref}/{script}".to_string(),
            ),
            (
                "github".to_string(),
                "https://raw.githubusercontent.com/{owner}/{repo}/{ref}/{path}".to_string(),
            ),
        ])
    }

    /// URL template configured for a scope
    pub fn template(&self, scope: &str) -> Option<&str> {
        self.0.get(scope).map(String::as_str)
    }

    /// Add or replace a scope
    pub fn insert(&mut self, scope: impl Into<String>, template: impl Into<String>) {
        self.0.insert(scope.into(), template.into());
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self(Self::builtin())
    }
}

impl<'de> Deserialize<'de> for SourcesConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let user = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut merged = Self::builtin();
        merged.extend(user);
        Ok(Self(merged))
    }
}
