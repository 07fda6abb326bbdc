// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::KillPolicy;
use crate::types::CommandSpec;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// script  = ["cargo build", "cargo test"]
/// ignore  = [".git", "target"]
/// verbose = false
///
/// [watch]
/// root = "."
/// use_hash = false
/// ```
///
/// All keys except `script` are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Command lines run in order on every trigger.
    #[serde(default)]
    pub script: Vec<String>,

    /// Relative paths or bare names excluded from watching.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Show captured output of passing commands too.
    #[serde(default)]
    pub verbose: bool,

    /// `[watch]` section.
    #[serde(default)]
    pub watch: WatchSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Directory to watch. Relative paths are resolved against the config
    /// file's directory; `None` means that directory itself.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Also compare file content hashes before triggering, so a touch without
    /// an edit does not rebuild.
    #[serde(default)]
    pub use_hash: bool,

    /// Exit polling interval while stopping a command.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Time a command gets to exit after SIGTERM before SIGKILL.
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,

    /// Reset the terminal before every run.
    #[serde(default = "default_clear_screen")]
    pub clear_screen: bool,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_kill_grace_ms() -> u64 {
    5000
}

fn default_clear_screen() -> bool {
    true
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            root: None,
            use_hash: false,
            poll_interval_ms: default_poll_interval_ms(),
            kill_grace_ms: default_kill_grace_ms(),
            clear_screen: default_clear_screen(),
        }
    }
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>`, so `commands` is
/// never empty.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    commands: Vec<CommandSpec>,
    pub ignore: Vec<String>,
    pub verbose: bool,
    pub watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        commands: Vec<CommandSpec>,
        ignore: Vec<String>,
        verbose: bool,
        watch: WatchSection,
    ) -> Self {
        Self {
            commands,
            ignore,
            verbose,
            watch,
        }
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn kill_policy(&self) -> KillPolicy {
        KillPolicy {
            poll_interval: Duration::from_millis(self.watch.poll_interval_ms),
            grace: Duration::from_millis(self.watch.kill_grace_ms),
        }
    }
}
