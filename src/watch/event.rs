// src/watch/event.rs

//! Backend-neutral filesystem events.

use std::path::PathBuf;

use notify::event::{EventKind, ModifyKind, RenameMode};

/// What happened to a path, reduced to the cases the scheduler distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Create,
    Remove,
    Write,
    Rename,
    /// Access, metadata-only changes and anything else we don't act on.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Split a `notify` event into one [`FsEvent`] per path.
///
/// Renames with known direction are turned into a removal of the old name
/// and a creation of the new one, so a directory moved into the tree gets
/// discovered and watched.
pub fn from_notify(event: notify::Event) -> Vec<FsEvent> {
    let notify::Event { kind, paths, .. } = event;

    if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = kind {
        let mut paths = paths.into_iter();
        return [
            paths.next().map(|p| FsEvent::new(FsEventKind::Remove, p)),
            paths.next().map(|p| FsEvent::new(FsEventKind::Create, p)),
        ]
        .into_iter()
        .flatten()
        .collect();
    }

    let kind = match kind {
        EventKind::Create(_) => FsEventKind::Create,
        EventKind::Remove(_) => FsEventKind::Remove,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => FsEventKind::Remove,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => FsEventKind::Create,
        EventKind::Modify(ModifyKind::Name(_)) => FsEventKind::Rename,
        EventKind::Modify(ModifyKind::Metadata(_)) => FsEventKind::Other,
        EventKind::Modify(_) | EventKind::Any => FsEventKind::Write,
        EventKind::Access(_) | EventKind::Other => FsEventKind::Other,
    };

    paths.into_iter().map(|p| FsEvent::new(kind, p)).collect()
}
