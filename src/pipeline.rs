//! Acquire-and-execute pipeline
//!
//! One invocation walks these stages, aborting on the first error:
//!
//! ```text
//! Idle -> DirectoryEnsured -> LockHeld -> {FetchSkipped | Fetched}
//!      -> LockReleased -> {Viewed | Executed} -> Done
//! ```
//!
//! Only the fetch decision runs under the slot lock; the script itself
//! runs after the lock is released. A raised cancel flag abandons an
//! in-flight fetch and stops the script from being launched.

use crate::cache::{CacheSlot, CacheStore, Locker};
use crate::error::{RunError, RunResult};
use crate::executor::{Invocation, ScriptExecutor};
use crate::fetch::Fetcher;
use crate::reference::ScriptLocator;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often an in-flight fetch checks the cancel flag
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Resolved intent for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Which script, and where it comes from
    pub locator: ScriptLocator,
    /// Program to pass the script to, if it is not run directly
    pub interpreter: Option<String>,
    /// Arguments passed through to the script
    pub args: Vec<String>,
    /// Re-fetch even if the script is cached
    pub update: bool,
    /// Print the script instead of running it
    pub view: bool,
}

impl RunOptions {
    /// Run `locator` directly with no arguments
    pub fn new(locator: ScriptLocator) -> Self {
        Self {
            locator,
            interpreter: None,
            args: Vec::new(),
            update: false,
            view: false,
        }
    }
}

/// Stages of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    DirectoryEnsured,
    LockHeld,
    FetchSkipped,
    Fetched,
    LockReleased,
    Viewed,
    Executed,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::DirectoryEnsured => "directory-ensured",
            Self::LockHeld => "lock-held",
            Self::FetchSkipped => "fetch-skipped",
            Self::Fetched => "fetched",
            Self::LockReleased => "lock-released",
            Self::Viewed => "viewed",
            Self::Executed => "executed",
            Self::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Whether the critical section fetched or reused the cached script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Skipped,
    Fetched,
}

/// A cache slot whose script is present and unlocked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedScript {
    pub slot: CacheSlot,
    pub outcome: FetchOutcome,
}

/// Drives resolution output through cache, lock, fetch and execution
pub struct Pipeline {
    store: CacheStore,
    locker: Locker,
    fetcher: Arc<dyn Fetcher>,
    executor: Arc<dyn ScriptExecutor>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Pipeline {
    /// Assemble a pipeline from its parts
    pub fn new(
        store: CacheStore,
        locker: Locker,
        fetcher: Arc<dyn Fetcher>,
        executor: Arc<dyn ScriptExecutor>,
    ) -> Self {
        Self {
            store,
            locker,
            fetcher,
            executor,
            cancel: None,
        }
    }

    /// Abandon fetches and skip execution once `flag` becomes true
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The cache this pipeline reads and fills
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Make sure the script is cached, fetching under the slot lock if needed
    pub async fn prepare(&self, options: &RunOptions) -> RunResult<PreparedScript> {
        let locator = &options.locator;
        trace_stage(locator, Stage::Idle);

        let slot = self.store.ensure_slot(locator).await?;
        trace_stage(locator, Stage::DirectoryEnsured);

        let guard = self.locker.acquire(&slot.lock_path).await?;
        trace_stage(locator, Stage::LockHeld);

        let result = self.fetch_if_needed(&slot, options).await;
        guard.release();
        trace_stage(locator, Stage::LockReleased);

        let outcome = result?;
        Ok(PreparedScript { slot, outcome })
    }

    /// Prepare the script, then view or run it; returns the child's exit code
    pub async fn execute(&self, options: &RunOptions) -> RunResult<i32> {
        let locator = &options.locator;
        let prepared = self.prepare(options).await?;
        let script_path = &prepared.slot.script_path;

        if self.is_cancelled() {
            return Err(RunError::Interrupted);
        }

        let code = if options.view {
            let code = self.executor.view(script_path).await?;
            trace_stage(locator, Stage::Viewed);
            code
        } else {
            let invocation =
                Invocation::for_run(script_path, options.interpreter.as_deref(), &options.args);
            let code = self.executor.run(invocation.argv()).await?;
            trace_stage(locator, Stage::Executed);
            code
        };

        trace_stage(locator, Stage::Done);
        Ok(code)
    }

    async fn fetch_if_needed(
        &self,
        slot: &CacheSlot,
        options: &RunOptions,
    ) -> RunResult<FetchOutcome> {
        let locator = &options.locator;

        if !CacheStore::needs_fetch(slot, options.update) {
            trace_stage(locator, Stage::FetchSkipped);
            return Ok(FetchOutcome::Skipped);
        }

        if options.update {
            info!("Updating {} from {}", locator, locator.source_url);
        }
        self.fetch_cancellable(&locator.source_url, &slot.script_path)
            .await?;
        trace_stage(locator, Stage::Fetched);
        Ok(FetchOutcome::Fetched)
    }

    /// Run the fetch, dropping it as soon as the cancel flag is raised
    async fn fetch_cancellable(&self, url: &str, dest: &Path) -> RunResult<()> {
        let Some(flag) = &self.cancel else {
            return self.fetcher.fetch(url, dest).await;
        };

        tokio::select! {
            result = self.fetcher.fetch(url, dest) => result,
            () = raised(flag) => {
                warn!("Fetch of {} interrupted", url);
                Err(RunError::Interrupted)
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

/// Resolves once `flag` is true
async fn raised(flag: &AtomicBool) {
    while !flag.load(Ordering::SeqCst) {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
    }
}

fn trace_stage(locator: &ScriptLocator, stage: Stage) {
    debug!(script = %locator, %stage, "pipeline stage");
}
