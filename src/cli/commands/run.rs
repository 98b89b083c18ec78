//! Run command - resolve, cache and execute one script

use crate::cache::{CacheStore, Locker};
use crate::cli::args::Cli;
use crate::config::Config;
use crate::error::RunResult;
use crate::executor::ProcessExecutor;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::pipeline::{Pipeline, RunOptions};
use crate::reference::Resolver;
use crate::ui::{TaskSpinner, UiContext};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Execute a script reference and return the script's exit code
pub async fn execute(reference: &str, cli: &Cli, config: &Config) -> RunResult<i32> {
    let locator = Resolver::from_config(config).resolve(reference)?;
    debug!("Resolved {} to {}", reference, locator.source_url);

    let options = RunOptions {
        interpreter: cli.interpreter.clone(),
        args: cli.script_args().to_vec(),
        update: cli.update,
        view: cli.view,
        ..RunOptions::new(locator)
    };

    let ctx = UiContext::detect();
    let fetcher: Arc<dyn Fetcher> = Arc::new(SpinnerFetcher {
        inner: HttpFetcher::new(&config.fetch),
        ctx,
    });

    let interrupted = interrupt_flag();
    let pipeline = Pipeline::new(
        CacheStore::new(&config.general.data_dir, &config.lock.suffix),
        Locker::new()
            .with_timeout(config.lock.timeout())
            .with_cancel_flag(Arc::clone(&interrupted)),
        fetcher,
        Arc::new(ProcessExecutor::new()),
    )
    .with_cancel_flag(interrupted);

    pipeline.execute(&options).await
}

/// Flag raised on Ctrl-C so a lock wait or download can be abandoned
fn interrupt_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let raised = Arc::clone(&flag);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            raised.store(true, Ordering::SeqCst);
        }
    });
    flag
}

/// Shows a spinner on stderr for the duration of a download
struct SpinnerFetcher {
    inner: HttpFetcher,
    ctx: UiContext,
}

#[async_trait]
impl Fetcher for SpinnerFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> RunResult<()> {
        let spinner = TaskSpinner::start(&self.ctx, &format!("Fetching {}", url));
        let result = self.inner.fetch(url, dest).await;
        match result {
            Ok(()) => spinner.clear(),
            Err(_) => spinner.fail(&format!("Failed to fetch {}", url)),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn config_with_source(data_dir: &Path, source_dir: &Path) -> Config {
        let mut config = Config::default();
        config.general.data_dir = data_dir.to_path_buf();
        config.sources.insert(
            "local",
            format!("file://{}/{{script}}", source_dir.display()),
        );
        config
    }

    #[tokio::test]
    async fn runs_local_script_with_args() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("code"), "exit \"$1\"\n").unwrap();
        let config = config_with_source(&temp.path().join("data"), &source);

        let cli = Cli::parse_from(["run", "-i", "sh", "local:code", "5"]);
        let code = execute("local:code", &cli, &config).await.unwrap();

        assert_eq!(code, 5);
    }

    #[tokio::test]
    async fn invalid_reference_is_rejected_before_fetch() {
        let temp = TempDir::new().unwrap();
        let config = config_with_source(&temp.path().join("data"), temp.path());

        let cli = Cli::parse_from(["run", "local:../escape"]);
        let err = execute("local:../escape", &cli, &config).await.unwrap_err();

        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
        assert!(!temp.path().join("data").exists());
    }
}
