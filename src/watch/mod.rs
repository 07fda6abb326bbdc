// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Subscribing directories through a cross-platform watcher (`notify`).
//! - Translating raw notifications into [`FsEvent`]s.
//! - Matching paths against the configured ignore list.
//! - Remembering modification times so duplicate notifications are dropped.
//!
//! It does **not** decide when to rebuild; that is the engine's job.

pub mod event;
pub mod ignore;
pub mod index;
pub mod path_utils;
pub mod watcher;

pub use event::{FsEvent, FsEventKind};
pub use ignore::IgnoreSet;
pub use index::{ModificationIndex, compute_file_hash};
pub use watcher::{NotifyBackend, WatchBackend, WatchStreams};
