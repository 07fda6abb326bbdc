// src/watch/index.rs

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexEntry {
    modified: SystemTime,
    content_hash: Option<String>,
}

/// Last accepted modification time (and optionally content hash) per path.
///
/// Used to drop duplicate notifications for a change that was already acted
/// on. A missing entry means "unknown": the next sighting counts as a change.
#[derive(Debug, Default)]
pub struct ModificationIndex {
    entries: HashMap<PathBuf, IndexEntry>,
}

impl ModificationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.entries.get(path).map(|e| e.modified)
    }

    /// True if `modified` is exactly what was last recorded for `path`.
    pub fn is_current(&self, path: &Path, modified: SystemTime) -> bool {
        self.modified(path) == Some(modified)
    }

    /// Record a new modification time.
    ///
    /// Returns whether the content changed: always true unless both the old
    /// and the new record carry a content hash and those hashes are equal.
    pub fn record(
        &mut self,
        path: &Path,
        modified: SystemTime,
        content_hash: Option<String>,
    ) -> bool {
        let previous = self.entries.insert(
            path.to_path_buf(),
            IndexEntry {
                modified,
                content_hash: content_hash.clone(),
            },
        );
        match (previous.and_then(|e| e.content_hash), content_hash) {
            (Some(old), Some(new)) => old != new,
            _ => true,
        }
    }

    /// Drop `path` and every entry below it. Returns how many were removed.
    pub fn forget(&mut self, path: &Path) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p, _| !p.starts_with(path));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(?path, removed, "forgot modification times");
        }
        removed
    }
}

/// Compute the blake3 hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
