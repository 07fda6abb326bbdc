// src/watch/ignore.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::watch::path_utils::relative_str;

/// Paths excluded from both watching and triggering.
///
/// Each configured entry is matched against the path relative to the watch
/// root:
///
/// - `src/generated` matches exactly that relative path;
/// - glob syntax is allowed (`*` does not cross `/`), e.g. `docs/*.md`;
/// - an entry without a `/` also matches a file or directory of that name at
///   any depth, so `target` excludes `target/` and `crates/foo/target/`.
///
/// The watch root itself is never ignored.
#[derive(Clone)]
pub struct IgnoreSet {
    root: PathBuf,
    entries: Vec<String>,
    paths: GlobSet,
    names: GlobSet,
}

impl fmt::Debug for IgnoreSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnoreSet")
            .field("root", &self.root)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl IgnoreSet {
    pub fn new(root: impl Into<PathBuf>, entries: &[String]) -> Result<Self> {
        let mut paths = GlobSetBuilder::new();
        let mut names = GlobSetBuilder::new();
        let mut kept = Vec::with_capacity(entries.len());

        for raw in entries {
            let entry = raw.trim().trim_start_matches("./").trim_end_matches('/');
            if entry.is_empty() {
                continue;
            }
            let glob = GlobBuilder::new(entry)
                .literal_separator(true)
                .build()
                .with_context(|| format!("invalid ignore pattern: {raw}"))?;
            if !entry.contains('/') {
                names.add(glob.clone());
            }
            paths.add(glob);
            kept.push(entry.to_string());
        }

        Ok(Self {
            root: root.into(),
            entries: kept,
            paths: paths.build()?,
            names: names.build()?,
        })
    }

    /// An ignore set that excludes nothing.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
            paths: GlobSet::empty(),
            names: GlobSet::empty(),
        }
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        let Some(rel) = relative_str(&self.root, path) else {
            return false;
        };
        self.is_ignored_rel(&rel)
    }

    /// Same as [`IgnoreSet::is_ignored`] for an already relative path.
    pub fn is_ignored_rel(&self, rel: &str) -> bool {
        if rel.is_empty() {
            return false;
        }
        if self.paths.is_match(rel) {
            return true;
        }
        let name = rel.rsplit('/').next().unwrap_or(rel);
        self.names.is_match(name)
    }
}
