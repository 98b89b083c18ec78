//! runscripts - fetch, cache and run scripts by short reference
//!
//! `run [SCOPE:]SCRIPT` resolves the reference to a URL, downloads the
//! script once into a per-user cache (serialized by a file lock so
//! concurrent invocations fetch at most once) and executes it.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod pipeline;
pub mod reference;
pub mod ui;

pub use error::{RunError, RunResult};
