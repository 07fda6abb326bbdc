// src/watch/watcher.rs

use std::path::Path;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use crate::watch::event::{FsEvent, from_notify};

/// Per-directory watch subscription.
///
/// The scheduler subscribes each directory individually (non-recursively) so
/// ignored directories never produce events.
pub trait WatchBackend: Send {
    fn watch(&mut self, path: &Path) -> Result<()>;
    fn unwatch(&mut self, path: &Path) -> Result<()>;
}

/// Receiving ends of a watch subscription.
#[derive(Debug)]
pub struct WatchStreams {
    pub events: mpsc::UnboundedReceiver<FsEvent>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

/// Production backend wrapping `notify::RecommendedWatcher`.
///
/// Dropping it closes the subscription.
pub struct NotifyBackend {
    inner: RecommendedWatcher,
}

impl std::fmt::Debug for NotifyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyBackend").finish()
    }
}

impl NotifyBackend {
    /// Create the OS watcher and the channels its callback feeds.
    ///
    /// Failure here is fatal at startup.
    pub fn new() -> Result<(Self, WatchStreams), notify::Error> {
        let (event_tx, events) = mpsc::unbounded_channel::<FsEvent>();
        let (error_tx, errors) = mpsc::unbounded_channel::<notify::Error>();

        // Called synchronously on notify's own thread.
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for ev in from_notify(event) {
                        // Receiver gone means the control loop exited.
                        let _ = event_tx.send(ev);
                    }
                }
                Err(err) => {
                    let _ = error_tx.send(err);
                }
            },
            Config::default(),
        )?;

        Ok((Self { inner }, WatchStreams { events, errors }))
    }
}

impl WatchBackend for NotifyBackend {
    fn watch(&mut self, path: &Path) -> Result<()> {
        debug!(?path, "subscribing");
        self.inner.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        debug!(?path, "unsubscribing");
        self.inner.unwatch(path)?;
        Ok(())
    }
}
