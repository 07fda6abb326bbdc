// src/exec/sink.rs

//! Output sinks for chain execution.
//!
//! Chains never write to stdout directly; they receive an
//! `Arc<dyn OutputSink>` so tests can capture exactly what a user would see.

use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Byte-stream destination for status markers and captured command output.
pub trait OutputSink: Send + Sync {
    /// Append bytes to the sink. Errors are the sink's own business; a broken
    /// terminal must not abort a build.
    fn write(&self, bytes: &[u8]);

    /// Clear the display before a new run starts.
    fn clear(&self);
}

/// Sink writing to the process's standard output.
#[derive(Debug, Clone, Copy)]
pub struct StdoutSink {
    clear_screen: bool,
}

impl StdoutSink {
    pub fn new(clear_screen: bool) -> Self {
        Self { clear_screen }
    }
}

impl OutputSink for StdoutSink {
    fn write(&self, bytes: &[u8]) {
        let mut out = std::io::stdout().lock();
        if let Err(err) = out.write_all(bytes).and_then(|_| out.flush()) {
            warn!(error = %err, "failed to write to stdout");
        }
    }

    fn clear(&self) {
        if self.clear_screen {
            // Full terminal reset (RIS).
            self.write(b"\x1bc");
        }
    }
}

/// In-memory sink; every `clear` is recorded so callers can count runs.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    inner: Arc<Mutex<BufferInner>>,
}

#[derive(Debug, Default)]
struct BufferInner {
    bytes: Vec<u8>,
    clears: usize,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&inner.bytes).into_owned()
    }

    /// Number of times the display was cleared.
    pub fn clears(&self) -> usize {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).clears
    }
}

impl OutputSink for BufferSink {
    fn write(&self, bytes: &[u8]) {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.bytes.extend_from_slice(bytes);
    }

    fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.clears += 1;
    }
}
