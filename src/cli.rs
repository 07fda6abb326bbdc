// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `chainwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "chainwatch",
    version,
    about = "Re-run a chain of build/test commands whenever source files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Chainwatch.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Directory to watch, overriding `[watch].root`.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Show output of passing commands too.
    #[arg(short, long)]
    pub verbose: bool,

    /// Extra path or name to ignore (repeatable).
    #[arg(long = "ignore", value_name = "ENTRY")]
    pub ignore: Vec<String>,

    /// Run the chain once and exit with its status, no watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CHAINWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved setup, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
