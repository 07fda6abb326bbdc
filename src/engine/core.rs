// src/engine/core.rs

//! Watch-state core: which directories are subscribed, which changes are
//! real, and when a rebuild is due.
//!
//! [`WatchCore`] is owned by the control loop and never shared, so none of
//! its state is locked. It performs filesystem reads through a
//! [`FileSystem`] and subscriptions through a [`WatchBackend`], which lets
//! tests drive it with [`crate::fs::mock::MockFileSystem`] and a fake backend.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::engine::TriggerReason;
use crate::fs::FileSystem;
use crate::watch::{
    FsEvent, FsEventKind, IgnoreSet, ModificationIndex, WatchBackend, compute_file_hash,
};

pub struct WatchCore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    backend: Box<dyn WatchBackend>,
    ignore: IgnoreSet,
    watched: HashSet<PathBuf>,
    index: ModificationIndex,
    use_hash: bool,
}

impl std::fmt::Debug for WatchCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchCore")
            .field("root", &self.root)
            .field("watched", &self.watched.len())
            .field("indexed", &self.index.len())
            .field("use_hash", &self.use_hash)
            .finish_non_exhaustive()
    }
}

impl WatchCore {
    /// `ignore` must be rooted at `root`.
    pub fn new(
        root: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        backend: Box<dyn WatchBackend>,
        ignore: IgnoreSet,
    ) -> Self {
        Self {
            root: root.into(),
            fs,
            backend,
            ignore,
            watched: HashSet::new(),
            index: ModificationIndex::new(),
            use_hash: false,
        }
    }

    /// Compare content hashes in addition to modification times.
    pub fn with_content_hashing(mut self, use_hash: bool) -> Self {
        self.use_hash = use_hash;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched.contains(path)
    }

    pub fn index(&self) -> &ModificationIndex {
        &self.index
    }

    /// Subscribe the whole tree under the root. Always yields the baseline
    /// trigger, whether or not any file exists.
    pub fn initial_walk(&mut self) -> TriggerReason {
        let root = self.root.clone();
        let found_files = self.discover(&root);
        debug!(
            root = ?self.root,
            dirs = self.watched.len(),
            found_files,
            "initial walk complete"
        );
        TriggerReason::Initial
    }

    /// Subscribe every non-ignored directory under `path` not yet watched.
    ///
    /// Returns true if the walk saw any non-directory entry. Entries that
    /// cannot be stat'ed, and directories that cannot be subscribed or
    /// listed, are skipped along with their subtree.
    pub fn discover(&mut self, path: &Path) -> bool {
        if self.watched.contains(path) {
            return false;
        }

        let mut found_files = false;
        let mut stack = vec![path.to_path_buf()];

        while let Some(p) = stack.pop() {
            let stat = match self.fs.stat(&p) {
                Ok(stat) => stat,
                Err(err) => {
                    trace!(path = ?p, error = %err, "cannot stat; skipping subtree");
                    continue;
                }
            };

            if self.ignore.is_ignored(&p) {
                trace!(path = ?p, "ignored during walk");
                continue;
            }

            if !stat.is_dir {
                found_files = true;
                continue;
            }

            if self.watched.contains(&p) {
                continue;
            }

            if let Err(err) = self.backend.watch(&p) {
                warn!(path = ?p, error = %err, "failed to watch directory; skipping subtree");
                continue;
            }
            self.watched.insert(p.clone());

            match self.fs.read_dir(&p) {
                Ok(children) => stack.extend(children),
                Err(err) => {
                    warn!(path = ?p, error = %err, "failed to list directory");
                }
            }
        }

        found_files
    }

    /// Classify one event and decide whether it warrants a rebuild.
    pub fn handle_event(&mut self, event: &FsEvent) -> Option<TriggerReason> {
        let path = event.path.as_path();
        let change_worthy = match event.kind {
            FsEventKind::Create => self.discover(path),
            FsEventKind::Remove => {
                self.unwatch_tree(path);
                true
            }
            FsEventKind::Write | FsEventKind::Rename => true,
            FsEventKind::Other => false,
        };

        if !change_worthy {
            trace!(?event, "event not change-worthy");
            return None;
        }

        self.maybe_queue(path)
    }

    /// Decide whether a change to `path` should trigger a rebuild, updating
    /// the modification index on the way.
    pub fn maybe_queue(&mut self, path: &Path) -> Option<TriggerReason> {
        if self.ignore.is_ignored(path) {
            trace!(?path, "ignored path; dropping event");
            return None;
        }

        let stat = match self.fs.stat(path) {
            Ok(stat) => stat,
            Err(_) => {
                // Most likely deleted; a missing file always invalidates the build.
                self.index.forget(path);
                debug!(?path, "path is gone; triggering rebuild");
                return Some(TriggerReason::Removed(path.to_path_buf()));
            }
        };

        if self.index.is_current(path, stat.modified) {
            debug!(?path, "modification time unchanged; dropping duplicate event");
            return None;
        }

        let content_hash = if self.use_hash && !stat.is_dir {
            match compute_file_hash(self.fs.as_ref(), path) {
                Ok(hash) => Some(hash),
                Err(err) => {
                    warn!(?path, error = %err, "failed to hash file; treating as changed");
                    None
                }
            }
        } else {
            None
        };

        if self.index.record(path, stat.modified, content_hash) {
            debug!(?path, "change accepted; triggering rebuild");
            Some(TriggerReason::Changed(path.to_path_buf()))
        } else {
            debug!(?path, "content hash unchanged; skipping rebuild");
            None
        }
    }

    /// Drop subscriptions for `path` and any directory below it.
    fn unwatch_tree(&mut self, path: &Path) {
        let gone: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect();

        for dir in gone {
            self.watched.remove(&dir);
            // The OS usually drops the watch itself when the directory goes.
            if let Err(err) = self.backend.unwatch(&dir) {
                trace!(path = ?dir, error = %err, "unwatch failed");
            }
        }
    }
}
