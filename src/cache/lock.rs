//! Advisory file locks over cache slots
//!
//! A [`Locker`] takes an exclusive `flock(2)` on a slot's lock file. The
//! returned [`LockGuard`] unlocks when released or dropped, so every
//! acquisition has exactly one release on every control path.
//!
//! `flock` locks belong to the open file description: two `open()`s of the
//! same lock file exclude each other even inside one process.

use crate::error::{RunError, RunResult};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Delay between non-blocking attempts when the wait is bounded
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Acquires exclusive locks, waiting forever unless bounded
#[derive(Debug, Clone, Default)]
pub struct Locker {
    timeout: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Locker {
    /// Locker that waits forever
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the wait; `None` waits forever
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Abort the wait once `flag` becomes true
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Block until an exclusive lock on `lock_path` is held
    ///
    /// Creates the lock file and its parent directory if needed.
    pub async fn acquire(&self, lock_path: &Path) -> RunResult<LockGuard> {
        let file = open_lock_file(lock_path).map_err(|e| RunError::LockAcquireFailed {
            path: lock_path.to_path_buf(),
            source: e,
        })?;

        let file = if self.timeout.is_none() && self.cancel.is_none() {
            self.wait_blocking(lock_path, file).await?
        } else {
            self.wait_polling(lock_path, file).await?
        };

        debug!("Acquired lock {}", lock_path.display());
        Ok(LockGuard {
            file: Some(file),
            path: lock_path.to_path_buf(),
        })
    }

    async fn wait_blocking(&self, lock_path: &Path, file: File) -> RunResult<File> {
        let path = lock_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            flock(&file, libc::LOCK_EX)
                .map(|()| file)
                .map_err(|e| RunError::LockAcquireFailed { path, source: e })
        })
        .await
        .map_err(|e| RunError::Internal(format!("lock wait task failed: {}", e)))?
    }

    async fn wait_polling(&self, lock_path: &Path, file: File) -> RunResult<File> {
        let start = Instant::now();
        loop {
            match try_flock_exclusive(&file) {
                Ok(true) => return Ok(file),
                Ok(false) => {}
                Err(e) => {
                    return Err(RunError::LockAcquireFailed {
                        path: lock_path.to_path_buf(),
                        source: e,
                    })
                }
            }

            if self
                .cancel
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::SeqCst))
            {
                return Err(RunError::LockCancelled {
                    path: lock_path.to_path_buf(),
                });
            }
            if let Some(timeout) = self.timeout {
                let waited = start.elapsed();
                if waited >= timeout {
                    return Err(RunError::LockTimeout {
                        path: lock_path.to_path_buf(),
                        waited,
                    });
                }
            }

            tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
        }
    }
}

/// A held exclusive lock
#[derive(Debug)]
pub struct LockGuard {
    file: Option<File>,
    path: PathBuf,
}

impl LockGuard {
    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock
    pub fn release(mut self) {
        self.unlock();
    }

    fn unlock(&mut self) {
        if let Some(file) = self.file.take() {
            // Closing the descriptor drops the lock even if this fails
            if let Err(e) = flock(&file, libc::LOCK_UN) {
                warn!("Failed to unlock {}: {}", self.path.display(), e);
            }
            debug!("Released lock {}", self.path.display());
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.unlock();
    }
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
}

/// Non-blocking exclusive lock attempt; `Ok(false)` when already held
fn try_flock_exclusive(file: &File) -> io::Result<bool> {
    match flock(file, libc::LOCK_EX | libc::LOCK_NB) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
        Err(e) => Err(e),
    }
}

fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
    let fd = file.as_raw_fd();
    loop {
        // SAFETY: fd is owned by `file`, which outlives this call.
        let rc = unsafe { libc::flock(fd, operation) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
