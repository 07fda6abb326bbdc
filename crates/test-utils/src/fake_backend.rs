use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use chainwatch::watch::{FsEvent, WatchBackend, WatchStreams};

/// A watch backend that records subscriptions instead of talking to the OS.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    watched: Arc<Mutex<HashSet<PathBuf>>>,
    history: Arc<Mutex<Vec<BackendCall>>>,
    fail_on: Arc<Mutex<HashSet<PathBuf>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Watch(PathBuf),
    Unwatch(PathBuf),
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `watch` fail for this path.
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.fail_on.lock().unwrap().insert(path.into());
    }

    pub fn is_watched(&self, path: impl AsRef<Path>) -> bool {
        self.watched.lock().unwrap().contains(path.as_ref())
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        let mut v: Vec<_> = self.watched.lock().unwrap().iter().cloned().collect();
        v.sort();
        v
    }

    pub fn history(&self) -> Vec<BackendCall> {
        self.history.lock().unwrap().clone()
    }
}

impl WatchBackend for RecordingBackend {
    fn watch(&mut self, path: &Path) -> anyhow::Result<()> {
        if self.fail_on.lock().unwrap().contains(path) {
            anyhow::bail!("refusing to watch {:?}", path);
        }
        self.watched.lock().unwrap().insert(path.to_path_buf());
        self.history
            .lock()
            .unwrap()
            .push(BackendCall::Watch(path.to_path_buf()));
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> anyhow::Result<()> {
        self.watched.lock().unwrap().remove(path);
        self.history
            .lock()
            .unwrap()
            .push(BackendCall::Unwatch(path.to_path_buf()));
        Ok(())
    }
}

/// Sending ends for hand-fed watch streams.
#[derive(Debug, Clone)]
pub struct FakeWatchSource {
    pub events: mpsc::UnboundedSender<FsEvent>,
    pub errors: mpsc::UnboundedSender<notify::Error>,
}

impl FakeWatchSource {
    pub fn send(&self, event: FsEvent) {
        self.events.send(event).expect("runtime dropped event stream");
    }

    pub fn send_error(&self, msg: &str) {
        self.errors
            .send(notify::Error::generic(msg))
            .expect("runtime dropped error stream");
    }
}

pub fn fake_streams() -> (FakeWatchSource, WatchStreams) {
    let (events_tx, events) = mpsc::unbounded_channel();
    let (errors_tx, errors) = mpsc::unbounded_channel();
    (
        FakeWatchSource {
            events: events_tx,
            errors: errors_tx,
        },
        WatchStreams { events, errors },
    )
}
