//! Script execution
//!
//! Launches the cached script (directly, or through an interpreter) or
//! dumps it with `cat`, wired to the caller's terminal. The child's exit
//! status becomes ours so `run` is transparent to shell scripting.

use crate::error::{RunError, RunResult};
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Program used to display a script without running it
pub const VIEW_PROGRAM: &str = "cat";

/// Argument vector for one process launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<String>,
}

impl Invocation {
    /// `[script, args...]` or `[interpreter, script, args...]`
    pub fn for_run(script_path: &Path, interpreter: Option<&str>, args: &[String]) -> Self {
        let mut argv = Vec::with_capacity(args.len() + 2);
        if let Some(interpreter) = interpreter {
            argv.push(interpreter.to_string());
        }
        argv.push(script_path.to_string_lossy().into_owned());
        argv.extend(args.iter().cloned());
        Self { argv }
    }

    /// `["cat", script]`
    pub fn for_view(script_path: &Path) -> Self {
        Self {
            argv: vec![
                VIEW_PROGRAM.to_string(),
                script_path.to_string_lossy().into_owned(),
            ],
        }
    }

    /// The full argument vector, program first
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Runs or displays scripts
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Run an argument vector and return its exit code
    async fn run(&self, argv: &[String]) -> RunResult<i32>;

    /// Print a script's content verbatim and return the viewer's exit code
    async fn view(&self, script_path: &Path) -> RunResult<i32>;
}

/// Executor backed by real child processes with inherited stdio
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    /// Create a new process executor
    pub fn new() -> Self {
        Self
    }

    async fn spawn_inherited(&self, argv: &[String]) -> RunResult<i32> {
        let command = argv.join(" ");
        let Some((program, args)) = argv.split_first() else {
            return Err(RunError::execution_failed(
                command,
                io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
            ));
        };

        debug!("Executing: {:?}", argv);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| RunError::execution_failed(command.clone(), e))?;

        // The terminal delivers Ctrl-C to the child as well; stay alive to
        // report its status instead of dying first.
        let status = loop {
            tokio::select! {
                status = child.wait() => {
                    break status.map_err(|e| RunError::io(format!("waiting for {}", command), e))?;
                }
                _ = tokio::signal::ctrl_c() => {
                    debug!("Interrupt received while {} is running", program);
                }
            }
        };

        let code = exit_code(status);
        debug!("{} exited with {}", program, code);
        Ok(code)
    }
}

#[async_trait]
impl ScriptExecutor for ProcessExecutor {
    async fn run(&self, argv: &[String]) -> RunResult<i32> {
        self.spawn_inherited(argv).await
    }

    async fn view(&self, script_path: &Path) -> RunResult<i32> {
        self.spawn_inherited(Invocation::for_view(script_path).argv())
            .await
    }
}

/// Exit code of a finished child; `128 + signal` when it was killed
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}
