// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::watch::WatchStreams;

use super::core::WatchCore;
use super::run_state::RunState;

/// Requests the control loop to exit.
///
/// `close` consumes the handle, so shutdown can only be requested once.
/// Dropping the handle without calling `close` also stops the loop.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl ShutdownHandle {
    pub fn close(self) {
        // Err means the loop already exited.
        let _ = self.tx.send(());
    }
}

/// The control loop: owns the watch state and reacts to filesystem events,
/// filesystem errors and shutdown.
///
/// Chains run on their own tasks via [`RunState`], so the loop is never
/// blocked by a build; it only waits while a previous step is being stopped.
pub struct Runtime {
    core: WatchCore,
    run_state: Arc<RunState>,
    streams: WatchStreams,
    shutdown_rx: oneshot::Receiver<()>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        core: WatchCore,
        run_state: Arc<RunState>,
        streams: WatchStreams,
    ) -> (Self, ShutdownHandle) {
        let (tx, shutdown_rx) = oneshot::channel();
        let runtime = Self {
            core,
            run_state,
            streams,
            shutdown_rx,
        };
        (runtime, ShutdownHandle { tx })
    }

    /// Main event loop.
    ///
    /// - Walks the root and starts the baseline run.
    /// - Dispatches events to the core; triggers rebuilds through `RunState`.
    /// - On shutdown, stops the active chain and drops the subscription.
    pub async fn run(mut self) -> Result<()> {
        info!(root = ?self.core.root(), "chainwatch runtime started");

        let reason = self.core.initial_walk();
        self.run_state.trigger(&reason).await;

        loop {
            tokio::select! {
                Some(event) = self.streams.events.recv() => {
                    debug!(?event, "runtime received event");
                    if let Some(reason) = self.core.handle_event(&event) {
                        self.run_state.trigger(&reason).await;
                    }
                }
                Some(err) = self.streams.errors.recv() => {
                    warn!(error = %err, "file watch error");
                }
                _ = &mut self.shutdown_rx => {
                    info!("shutdown requested");
                    break;
                }
                else => {
                    info!("watch streams closed; exiting");
                    break;
                }
            }
        }

        self.run_state.stop().await;
        info!("runtime exiting");
        Ok(())
    }
}
