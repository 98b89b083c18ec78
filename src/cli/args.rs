//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser};
use std::path::PathBuf;

const EXAMPLES: &str = "\
Examples:
  run pt-summary
  run -i bash demo:hello --name world
  run github:runscripts/scripts/pt-summary@v1
  run --view pt-summary

Report bugs to <https://github.com/runscripts/runscripts/issues>.";

/// run - fetch, cache and run scripts by short reference
///
/// Scripts are fetched once into a local cache and reused on later runs.
#[derive(Parser, Debug)]
#[command(name = "run")]
#[command(author, version, about, long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Run the script with an interpreter (e.g. bash, python)
    #[arg(short, long, value_name = "INTERPRETER")]
    pub interpreter: Option<String>,

    /// Fetch the script again before running it
    #[arg(short, long)]
    pub update: bool,

    /// Print the script instead of running it
    #[arg(short = 'v', long)]
    pub view: bool,

    /// Clear out all locally cached scripts
    #[arg(short, long, conflicts_with_all = ["init", "script"])]
    pub clean: bool,

    /// Skip the confirmation prompt of --clean
    #[arg(short, long, requires = "clean")]
    pub yes: bool,

    /// Write the default configuration and create the data directory
    #[arg(short = 'I', long, conflicts_with = "script")]
    pub init: bool,

    /// Overwrite an existing configuration with --init
    #[arg(long, requires = "init")]
    pub force: bool,

    /// Configuration file path
    #[arg(long, env = "RUN_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (--verbose info, --verbose --verbose debug)
    #[arg(long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Script reference ([SCOPE:]SCRIPT[@REF]) followed by its arguments
    #[arg(value_name = "SCRIPT", trailing_var_arg = true)]
    pub script: Vec<String>,
}

impl Cli {
    /// The script reference, if one was given
    pub fn reference(&self) -> Option<&str> {
        self.script.first().map(String::as_str)
    }

    /// Arguments passed through to the script
    pub fn script_args(&self) -> &[String] {
        self.script.get(1..).unwrap_or_default()
    }
}
