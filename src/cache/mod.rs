//! On-disk script cache
//!
//! Scripts are cached per scope under a content-addressed slot directory:
//!
//! | Path | Contents |
//! |------|----------|
//! | `<base>/<scope>/<cache_id>/<file>` | cached script |
//! | `<base>/<scope>/<cache_id><suffix>` | slot lock file |
//!
//! The lock file is a sibling of the slot directory, never inside it.
//! Staleness policy: a present file is valid unless an update is forced.

pub mod lock;

pub use lock::{LockGuard, Locker};

use crate::error::{RunError, RunResult};
use crate::reference::ScriptLocator;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Filesystem location of one cached script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSlot {
    /// `<base>/<scope>/<cache_id>`
    pub directory_path: PathBuf,
    /// Cached script inside `directory_path`
    pub script_path: PathBuf,
    /// Lock file next to `directory_path`
    pub lock_path: PathBuf,
}

/// Maps locators to cache slots under a base directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    base_dir: PathBuf,
    lock_suffix: String,
}

impl CacheStore {
    /// Create a store rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>, lock_suffix: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            lock_suffix: lock_suffix.into(),
        }
    }

    /// Base directory of the cache
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Derive slot paths without touching the filesystem
    pub fn slot_for(&self, locator: &ScriptLocator) -> CacheSlot {
        let scope_dir = self.base_dir.join(&locator.scope);
        let directory_path = scope_dir.join(&locator.cache_id);
        let script_path = directory_path.join(locator.file_name());
        let lock_path = scope_dir.join(format!("{}{}", locator.cache_id, self.lock_suffix));

        CacheSlot {
            directory_path,
            script_path,
            lock_path,
        }
    }

    /// Derive slot paths and create the slot directory if missing
    pub async fn ensure_slot(&self, locator: &ScriptLocator) -> RunResult<CacheSlot> {
        let slot = self.slot_for(locator);

        fs::create_dir_all(&slot.directory_path)
            .await
            .map_err(|e| RunError::DirectoryCreateFailed {
                path: slot.directory_path.clone(),
                source: e,
            })?;

        debug!("Cache slot ready: {}", slot.directory_path.display());
        Ok(slot)
    }

    /// Whether the slot's script must be (re)fetched
    pub fn needs_fetch(slot: &CacheSlot, force_update: bool) -> bool {
        force_update || !slot.script_path.exists()
    }

    /// Remove every cached entry, keeping the base directory itself
    ///
    /// Returns the number of top-level entries removed.
    pub async fn clear(&self) -> RunResult<usize> {
        if !self.base_dir.exists() {
            return Ok(0);
        }

        let mut entries = fs::read_dir(&self.base_dir).await.map_err(|e| {
            RunError::io(format!("reading cache directory {}", self.base_dir.display()), e)
        })?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RunError::io("reading cache entry", e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| RunError::io(format!("inspecting {}", path.display()), e))?;

            let result = if file_type.is_dir() {
                fs::remove_dir_all(&path).await
            } else {
                fs::remove_file(&path).await
            };
            result.map_err(|e| RunError::io(format!("removing {}", path.display()), e))?;

            debug!("Removed {}", path.display());
            removed += 1;
        }

        Ok(removed)
    }
}
