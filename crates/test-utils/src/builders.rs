#![allow(dead_code)]

use std::path::PathBuf;

use chainwatch::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_command(mut self, line: &str) -> Self {
        self.config.script.push(line.to_string());
        self
    }

    pub fn with_ignore(mut self, entry: &str) -> Self {
        self.config.ignore.push(entry.to_string());
        self
    }

    pub fn verbose(mut self, val: bool) -> Self {
        self.config.verbose = val;
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.watch.root = Some(root.into());
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.config.watch.use_hash = val;
        self
    }

    pub fn kill_grace_ms(mut self, ms: u64) -> Self {
        self.config.watch.kill_grace_ms = ms;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
