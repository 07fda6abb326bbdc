// src/config/validate.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ChainwatchError, Result};
use crate::types::CommandSpec;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ChainwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let commands = parse_script(&raw)?;
        validate_ignore_entries(&raw.ignore)?;
        validate_watch_section(&raw)?;
        Ok(ConfigFile::new_unchecked(
            commands,
            raw.ignore,
            raw.verbose,
            raw.watch,
        ))
    }
}

fn parse_script(cfg: &RawConfigFile) -> Result<Vec<CommandSpec>> {
    if cfg.script.is_empty() {
        return Err(ChainwatchError::ConfigError(
            "`script` must contain at least one command".to_string(),
        ));
    }

    cfg.script
        .iter()
        .enumerate()
        .map(|(i, line)| {
            line.parse::<CommandSpec>().map_err(|e| {
                ChainwatchError::ConfigError(format!("script[{i}]: {e}"))
            })
        })
        .collect()
}

/// Ignore entries must be non-blank and relative to the watch root.
pub fn validate_ignore_entries(entries: &[String]) -> Result<()> {
    for entry in entries {
        if entry.trim().is_empty() {
            return Err(ChainwatchError::ConfigError(
                "`ignore` entries must not be empty".to_string(),
            ));
        }
        if Path::new(entry).is_absolute() {
            return Err(ChainwatchError::ConfigError(format!(
                "`ignore` entry '{}' must be relative to the watch root",
                entry
            )));
        }
    }
    Ok(())
}

fn validate_watch_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.poll_interval_ms == 0 {
        return Err(ChainwatchError::ConfigError(
            "[watch].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
