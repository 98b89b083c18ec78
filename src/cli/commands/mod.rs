//! CLI command implementations

pub mod clean;
pub mod init;
pub mod run;

pub use clean::execute as clean;
pub use init::execute as init;
pub use run::execute as run;
