// src/exec/chain.rs

//! Sequential, halt-on-failure, cancellable command chains.
//!
//! A chain is built once from an immutable list of [`CommandSpec`]s and
//! executed at most once. Steps run strictly in order; the first failing step
//! ends the chain. [`CommandChain::stop`] may be called from any task: it
//! kills the running step and guarantees that no later step starts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::exec::process::{KillPolicy, ProcessHandle, StepOutcome};
use crate::exec::sink::OutputSink;
use crate::types::CommandSpec;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChainError {
    #[error("a command chain needs at least one command")]
    Empty,

    #[error("command chain was already executed; build a new one per run")]
    AlreadyExecuted,
}

/// Fluent construction: `ChainBuilder::first(a).then(b).then(c).build()`.
#[derive(Debug, Clone)]
pub struct ChainBuilder {
    specs: Vec<CommandSpec>,
    verbose: bool,
    policy: KillPolicy,
}

impl ChainBuilder {
    pub fn first(spec: CommandSpec) -> Self {
        Self {
            specs: vec![spec],
            verbose: false,
            policy: KillPolicy::default(),
        }
    }

    /// Builder over an ordered list; fails if the list is empty.
    pub fn from_specs(specs: impl IntoIterator<Item = CommandSpec>) -> Result<Self, ChainError> {
        let mut specs = specs.into_iter();
        let first = specs.next().ok_or(ChainError::Empty)?;
        Ok(specs.fold(Self::first(first), Self::then))
    }

    pub fn then(mut self, spec: CommandSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn kill_policy(mut self, policy: KillPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> CommandChain {
        CommandChain {
            specs: self.specs,
            verbose: self.verbose,
            policy: self.policy,
            started: AtomicBool::new(false),
            control: Mutex::new(Control::default()),
        }
    }
}

/// Summary of one chain execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainResult {
    /// Whether any step failed (or the chain was stopped).
    pub failed: bool,
    /// Steps that were started, including the failing one.
    pub executed: usize,
    /// Steps in the chain.
    pub total: usize,
    /// Whether the chain was cut short by [`CommandChain::stop`].
    pub stopped: bool,
}

impl ChainResult {
    pub fn succeeded(&self) -> bool {
        !self.failed
    }
}

#[derive(Debug, Default)]
struct Control {
    current: Option<Arc<ProcessHandle>>,
    stopped: bool,
    executed: usize,
}

#[derive(Debug)]
pub struct CommandChain {
    specs: Vec<CommandSpec>,
    verbose: bool,
    policy: KillPolicy,
    started: AtomicBool,
    control: Mutex<Control>,
}

impl CommandChain {
    /// Build a chain from an ordered list of specs.
    pub fn from_specs(
        specs: impl IntoIterator<Item = CommandSpec>,
        verbose: bool,
        policy: KillPolicy,
    ) -> Result<Self, ChainError> {
        Ok(ChainBuilder::from_specs(specs)?
            .verbose(verbose)
            .kill_policy(policy)
            .build())
    }

    pub fn specs(&self) -> &[CommandSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Run every step in order, writing status and output to `sink`.
    pub async fn execute(&self, sink: &dyn OutputSink) -> Result<ChainResult, ChainError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ChainError::AlreadyExecuted);
        }

        let total = self.specs.len();
        let mut failed = false;

        for spec in &self.specs {
            let handle = {
                let mut control = self.control.lock().await;
                if control.stopped {
                    break;
                }
                let handle = Arc::new(ProcessHandle::with_policy(spec.clone(), self.policy));
                control.current = Some(Arc::clone(&handle));
                control.executed += 1;
                handle
            };

            let outcome = handle.run(sink, self.verbose).await;

            self.control.lock().await.current = None;

            if outcome == StepOutcome::Failed {
                debug!(cmd = %spec, "step failed; halting chain");
                failed = true;
                break;
            }
        }

        let control = self.control.lock().await;
        // A stop that arrives after the last step passed cut nothing short.
        let stopped = control.stopped && (failed || control.executed < total);
        let result = ChainResult {
            failed: failed || stopped,
            executed: control.executed,
            total,
            stopped,
        };
        info!(
            executed = result.executed,
            total,
            failed = result.failed,
            stopped = result.stopped,
            "chain finished"
        );
        Ok(result)
    }

    /// Cancel the chain: kill the running step, if any, and prevent the
    /// remaining steps from starting. A no-op on finished chains.
    pub async fn stop(&self) {
        let mut control = self.control.lock().await;
        if control.stopped {
            return;
        }
        control.stopped = true;
        if let Some(current) = control.current.as_ref() {
            debug!(cmd = %current.spec(), "stopping running step");
            current.kill().await;
        }
    }

    pub async fn is_stopped(&self) -> bool {
        self.control.lock().await.stopped
    }
}
