// src/engine/run_state.rs

//! The single "currently active chain".
//!
//! The control loop calls [`RunState::trigger`]; the chain itself runs on a
//! spawned task. The whole "stop old, clear display, install new, launch new"
//! sequence happens under one lock, so two chains never execute at once and
//! the previous step has been signalled before the next chain starts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use crate::engine::TriggerReason;
use crate::exec::{ChainBuilder, ChainResult, CommandChain, OutputSink};

/// Identifier of a triggered run, starting at 1.
pub type RunId = u64;

struct ActiveRun {
    id: RunId,
    chain: Arc<CommandChain>,
    done: watch::Receiver<Option<ChainResult>>,
}

pub struct RunState {
    template: ChainBuilder,
    sink: Arc<dyn OutputSink>,
    active: Mutex<Option<ActiveRun>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunState")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

impl RunState {
    /// `template` describes the chain every trigger builds afresh.
    pub fn new(template: ChainBuilder, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            template,
            sink,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Stop the active chain (if any), clear the display and launch a fresh
    /// chain in the background. Returns the id of the new run.
    pub async fn trigger(&self, reason: &TriggerReason) -> RunId {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            info!(run_id = previous.id, "stopping previous run");
            previous.chain.stop().await;
        }

        self.sink.clear();

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let chain = Arc::new(self.template.clone().build());
        let (done_tx, done_rx) = watch::channel(None);

        info!(run_id = id, %reason, steps = chain.len(), "starting run");

        let task_chain = Arc::clone(&chain);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let result = match task_chain.execute(sink.as_ref()).await {
                Ok(result) => result,
                Err(err) => {
                    warn!(run_id = id, error = %err, "chain could not execute");
                    ChainResult {
                        failed: true,
                        executed: 0,
                        total: task_chain.len(),
                        stopped: false,
                    }
                }
            };
            let _ = done_tx.send(Some(result));
        });

        *active = Some(ActiveRun {
            id,
            chain,
            done: done_rx,
        });

        id
    }

    /// Stop the active chain without starting a new one.
    pub async fn stop(&self) {
        let active = self.active.lock().await;
        if let Some(run) = active.as_ref() {
            info!(run_id = run.id, "stopping active run");
            run.chain.stop().await;
        }
    }

    /// Id of the most recently started run.
    pub async fn current_run(&self) -> Option<RunId> {
        self.active.lock().await.as_ref().map(|r| r.id)
    }

    /// Whether the most recent run is still executing.
    pub async fn is_running(&self) -> bool {
        match self.active.lock().await.as_ref() {
            Some(run) => run.done.borrow().is_none(),
            None => false,
        }
    }

    /// Wait for the most recently started run to finish and return its result.
    ///
    /// Returns `None` if no run was ever started, or if the run was replaced
    /// and its task went away before reporting.
    pub async fn wait_current(&self) -> Option<ChainResult> {
        let mut done = {
            let active = self.active.lock().await;
            active.as_ref()?.done.clone()
        };
        let result = done.wait_for(Option::is_some).await.ok()?;
        *result
    }
}
