//! run - fetch, cache and run scripts
//!
//! CLI entry point that dispatches to the run, init and clean actions.

use clap::{CommandFactory, Parser};
use console::style;
use runscripts::cli::{commands, Cli};
use runscripts::config::ConfigManager;
use runscripts::error::{RunError, RunResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            if matches!(e, RunError::Interrupted) {
                // An abandoned download may still occupy a blocking thread,
                // which would hold up runtime shutdown
                std::process::exit(i32::from(e.exit_code()));
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> RunResult<ExitCode> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Init rewrites the config, so a broken one must not stop it
    if cli.init {
        init_logging(cli.verbose, "text");
        commands::init(&config_manager, cli.force).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = config_manager.load().await?;
    init_logging(cli.verbose, &config.general.log_format);
    debug!("Using config {}", config_manager.path().display());

    if cli.clean {
        commands::clean(&config, cli.yes).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(reference) = cli.reference() else {
        Cli::command()
            .print_help()
            .map_err(|e| RunError::io("printing help", e))?;
        return Ok(ExitCode::SUCCESS);
    };

    let code = commands::run(reference, &cli, &config).await?;
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

/// Logs go to stderr: 0 = warn, 1 = info, 2+ = debug, RUST_LOG overrides
fn init_logging(verbose: u8, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("runscripts=warn,run=warn"),
        1 => EnvFilter::new("runscripts=info,run=info"),
        _ => EnvFilter::new("runscripts=debug,run=debug"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
