//! Error types for runscripts
//!
//! All modules use `RunResult<T>` as their return type. Every error is
//! fatal to the current invocation; nothing here is retried.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for runscripts operations
pub type RunResult<T> = Result<T, RunError>;

/// Exit status for bad user input (EX_USAGE)
pub const EXIT_USAGE: u8 = 64;
/// Exit status when the remote source is unreachable (EX_UNAVAILABLE)
pub const EXIT_UNAVAILABLE: u8 = 69;
/// Exit status for internal failures (EX_SOFTWARE)
pub const EXIT_SOFTWARE: u8 = 70;
/// Exit status when the cache cannot be created or locked (EX_CANTCREAT)
pub const EXIT_CANTCREAT: u8 = 73;
/// Exit status for configuration errors (EX_CONFIG)
pub const EXIT_CONFIG: u8 = 78;
/// Exit status when the command exists but cannot be executed
pub const EXIT_NOT_EXECUTABLE: u8 = 126;
/// Exit status when the command is not found
pub const EXIT_NOT_FOUND: u8 = 127;
/// Exit status after Ctrl-C, as if killed by SIGINT
pub const EXIT_INTERRUPTED: u8 = 130;

/// All errors that can occur while resolving, caching or running a script
#[derive(Error, Debug)]
pub enum RunError {
    // Reference errors
    #[error("Invalid script reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("Unknown scope '{0}': no source configured for it")]
    UnknownScope(String),

    // Cache errors
    #[error("Failed to create cache directory {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock {path}: {source}")]
    LockAcquireFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {waited:?} waiting for lock {path}")]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("Gave up waiting for lock {path}")]
    LockCancelled { path: PathBuf },

    #[error("Interrupted")]
    Interrupted,

    // Fetch errors
    #[error("Failed to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    // Process errors
    #[error("Failed to execute {command}: {source}")]
    ExecutionFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl RunError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create a fetch failed error
    pub fn fetch_failed(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an execution failed error
    pub fn execution_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::ExecutionFailed {
            command: command.into(),
            source,
        }
    }

    /// Process exit status to report for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidReference { .. } | Self::UnknownScope(_) | Self::User(_) => EXIT_USAGE,
            Self::DirectoryCreateFailed { .. }
            | Self::LockAcquireFailed { .. }
            | Self::LockTimeout { .. }
            | Self::LockCancelled { .. } => EXIT_CANTCREAT,
            Self::FetchFailed { .. } => EXIT_UNAVAILABLE,
            Self::Interrupted => EXIT_INTERRUPTED,
            Self::ExecutionFailed { source, .. } => {
                if source.kind() == std::io::ErrorKind::NotFound {
                    EXIT_NOT_FOUND
                } else {
                    EXIT_NOT_EXECUTABLE
                }
            }
            Self::ConfigInvalid { .. } | Self::ConfigDirCreate { .. } => EXIT_CONFIG,
            Self::Io { .. } | Self::Internal(_) => EXIT_SOFTWARE,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidReference { .. } => Some("References look like SCRIPT or SCOPE:SCRIPT"),
            Self::UnknownScope(_) => Some("Add the scope under [sources] in your config"),
            Self::DirectoryCreateFailed { .. } => {
                Some("Check permissions on the data directory, or run: run --init")
            }
            Self::LockTimeout { .. } => {
                Some("Another run may be stuck fetching; raise [lock] timeout_secs or retry")
            }
            Self::FetchFailed { .. } => Some("Check the network, or the script name and scope"),
            Self::ExecutionFailed { .. } => {
                Some("Pass an interpreter with -i, e.g. run -i bash SCRIPT")
            }
            _ => None,
        }
    }
}
