// src/exec/process.rs

//! A single external command invocation.
//!
//! A [`ProcessHandle`] is driven by two parties: the chain task calls
//! [`ProcessHandle::run`], and a canceller may call [`ProcessHandle::kill`]
//! at any point. Both go through one mutex, so:
//!
//! - a kill that lands before spawn means the process is never started;
//! - a kill that lands after spawn always finds a pid to signal;
//! - once the kill flag is set, no further bytes reach the sink.
//!
//! On unix every command leads its own process group, and signals go to the
//! whole group so helpers a shell or build tool started are stopped too.

use std::io;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::exec::sink::OutputSink;
use crate::types::CommandSpec;

pub const STATUS_RUNNING: &str = "[RUNNING]";
pub const STATUS_PASSED: &str = "[PASSED]";
pub const STATUS_FAILED: &str = "[FAILED]";

/// Result of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Failed,
}

impl StepOutcome {
    pub fn is_failed(self) -> bool {
        matches!(self, StepOutcome::Failed)
    }
}

/// How a kill waits for the process to go away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillPolicy {
    /// Interval between exit checks after the termination signal.
    pub poll_interval: Duration,
    /// Time allowed after SIGTERM before escalating to SIGKILL.
    pub grace: Duration,
}

impl Default for KillPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            grace: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Pending,
    Running { pid: Option<u32> },
    Stopping { pid: Option<u32> },
    Exited,
}

#[derive(Debug)]
struct Inner {
    lifecycle: Lifecycle,
    killed: bool,
}

/// One spawned-or-about-to-spawn external process.
#[derive(Debug)]
pub struct ProcessHandle {
    spec: CommandSpec,
    policy: KillPolicy,
    inner: Mutex<Inner>,
    /// Asks `run` to kill the child through tokio once politeness ran out.
    force: Notify,
}

impl ProcessHandle {
    pub fn new(spec: CommandSpec) -> Self {
        Self::with_policy(spec, KillPolicy::default())
    }

    pub fn with_policy(spec: CommandSpec, policy: KillPolicy) -> Self {
        Self {
            spec,
            policy,
            inner: Mutex::new(Inner {
                lifecycle: Lifecycle::Pending,
                killed: false,
            }),
            force: Notify::new(),
        }
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn is_killed(&self) -> bool {
        self.lock().killed
    }

    pub fn has_exited(&self) -> bool {
        matches!(self.lock().lifecycle, Lifecycle::Exited)
    }

    /// Start the process, wait for it and report its status to `sink`.
    ///
    /// Captured stdout+stderr is only written when `verbose` is set or the
    /// step failed.
    pub async fn run(&self, sink: &dyn OutputSink, verbose: bool) -> StepOutcome {
        self.write_if_alive(sink, format!("{STATUS_RUNNING} {}\n", self.spec).as_bytes());

        let mut cmd = Command::new(self.spec.program());
        cmd.args(self.spec.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let spawned = {
            let mut inner = self.lock();
            if inner.killed {
                debug!(cmd = %self.spec, "killed before spawn; not starting process");
                inner.lifecycle = Lifecycle::Exited;
                return StepOutcome::Failed;
            }
            match cmd.spawn() {
                Ok(child) => {
                    inner.lifecycle = Lifecycle::Running { pid: child.id() };
                    Ok(child)
                }
                Err(err) => {
                    inner.lifecycle = Lifecycle::Exited;
                    Err(err)
                }
            }
        };

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                warn!(cmd = %self.spec, error = %err, "failed to start command");
                self.write_if_alive(sink, format!("{STATUS_FAILED} {}\n", self.spec).as_bytes());
                self.write_if_alive(sink, start_error_text(&self.spec, &err).as_bytes());
                return StepOutcome::Failed;
            }
        };

        info!(cmd = %self.spec, pid = ?child.id(), "started command");

        let captured = Arc::new(Mutex::new(Vec::new()));
        let readers: Vec<JoinHandle<()>> = [
            child.stdout.take().map(|s| spawn_capture(s, Arc::clone(&captured))),
            child.stderr.take().map(|s| spawn_capture(s, Arc::clone(&captured))),
        ]
        .into_iter()
        .flatten()
        .collect();

        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                _ = self.force.notified() => {
                    if let Err(err) = child.start_kill() {
                        debug!(cmd = %self.spec, error = %err, "start_kill failed");
                    }
                }
            }
        };
        let killed = {
            let mut inner = self.lock();
            inner.lifecycle = Lifecycle::Exited;
            inner.killed
        };

        if killed {
            // Nobody will read the output; don't wait on pipes that a
            // grandchild may still hold open.
            for reader in readers {
                reader.abort();
            }
            debug!(cmd = %self.spec, "process exited after kill");
            return StepOutcome::Failed;
        }

        for reader in readers {
            if let Err(err) = reader.await {
                debug!(cmd = %self.spec, error = %err, "output reader task ended abnormally");
            }
        }

        let outcome = match &status {
            Ok(s) if s.success() => StepOutcome::Passed,
            Ok(s) => {
                info!(cmd = %self.spec, exit_code = ?s.code(), "command failed");
                StepOutcome::Failed
            }
            Err(err) => {
                warn!(cmd = %self.spec, error = %err, "waiting for command failed");
                StepOutcome::Failed
            }
        };

        let marker = match outcome {
            StepOutcome::Passed => STATUS_PASSED,
            StepOutcome::Failed => STATUS_FAILED,
        };
        self.write_if_alive(sink, format!("{marker} {}\n", self.spec).as_bytes());

        if let Err(err) = &status {
            self.write_if_alive(sink, format!("{}: {err}\n", self.spec.program()).as_bytes());
        }

        if verbose || outcome.is_failed() {
            let bytes = std::mem::take(&mut *lock_buf(&captured));
            self.write_if_alive(sink, &bytes);
        }

        outcome
    }

    /// Stop the process and suppress any further output.
    ///
    /// Sends SIGTERM to the process group, then polls every `poll_interval`
    /// until the process has exited. If it is still alive after `grace`, the
    /// group gets SIGKILL. Whatever is left of the group once the process has
    /// exited is killed as well. Returns immediately when the process was
    /// never started or already exited.
    ///
    /// Without unix signals there is no polite stop: the child is killed
    /// through tokio right away.
    pub async fn kill(&self) {
        let pid = {
            let mut inner = self.lock();
            inner.killed = true;
            match inner.lifecycle {
                Lifecycle::Running { pid } => {
                    inner.lifecycle = Lifecycle::Stopping { pid };
                    pid
                }
                // Someone else is already stopping it; just wait below.
                Lifecycle::Stopping { .. } => None,
                Lifecycle::Pending | Lifecycle::Exited => return,
            }
        };

        if let Some(pid) = pid {
            self.terminate(pid);
        }

        let poll = self.policy.poll_interval.max(Duration::from_millis(1));
        let mut waited = Duration::ZERO;
        let mut escalated = false;

        while !self.has_exited() {
            if waited >= self.policy.grace {
                if escalated {
                    warn!(cmd = %self.spec, "process did not exit after SIGKILL; giving up");
                    return;
                }
                warn!(cmd = %self.spec, ?pid, "process ignored SIGTERM; killing it");
                self.force_kill(pid);
                escalated = true;
                waited = Duration::ZERO;
            }
            tokio::time::sleep(poll).await;
            waited += poll;
        }

        debug!(cmd = %self.spec, "process exit observed after kill");

        if let Some(pid) = pid {
            self.sweep_group(pid);
        }
    }

    #[cfg(unix)]
    fn terminate(&self, pid: u32) {
        info!(cmd = %self.spec, pid, "sending SIGTERM to process group");
        if let Err(err) = signal::kill_group(pid, signal::Signal::SIGTERM) {
            debug!(cmd = %self.spec, pid, error = %err, "SIGTERM not delivered");
        }
    }

    #[cfg(not(unix))]
    fn terminate(&self, pid: u32) {
        info!(cmd = %self.spec, pid, "killing process");
        self.force.notify_one();
    }

    #[cfg(unix)]
    fn force_kill(&self, pid: Option<u32>) {
        if let Some(pid) = pid {
            if let Err(err) = signal::kill_group(pid, signal::Signal::SIGKILL) {
                debug!(cmd = %self.spec, pid, error = %err, "SIGKILL not delivered");
            }
        }
        self.force.notify_one();
    }

    #[cfg(not(unix))]
    fn force_kill(&self, _pid: Option<u32>) {
        self.force.notify_one();
    }

    /// Kill members of the group that outlived their leader.
    #[cfg(unix)]
    fn sweep_group(&self, pid: u32) {
        match signal::kill_group(pid, signal::Signal::SIGKILL) {
            Ok(()) => debug!(cmd = %self.spec, pid, "killed leftover group members"),
            Err(nix::errno::Errno::ESRCH) => {}
            Err(err) => debug!(cmd = %self.spec, pid, error = %err, "group sweep failed"),
        }
    }

    #[cfg(not(unix))]
    fn sweep_group(&self, _pid: u32) {}

    fn write_if_alive(&self, sink: &dyn OutputSink, bytes: &[u8]) {
        let inner = self.lock();
        if !inner.killed {
            sink.write(bytes);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn start_error_text(spec: &CommandSpec, err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => {
            format!("{}: executable file not found\n", spec.program())
        }
        _ => format!("{}: {err}\n", spec.program()),
    }
}

fn lock_buf(buf: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Copy a pipe into the shared capture buffer, chunk by chunk, so stdout
/// and stderr interleave in arrival order.
fn spawn_capture<R>(mut reader: R, buf: Arc<Mutex<Vec<u8>>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => lock_buf(&buf).extend_from_slice(&chunk[..n]),
                Err(err) => {
                    debug!(error = %err, "error reading command output");
                    break;
                }
            }
        }
    })
}

#[cfg(unix)]
mod signal {
    pub use nix::sys::signal::Signal;
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    /// `pid` leads its own group, so the group id equals the pid.
    pub fn kill_group(pid: u32, signal: Signal) -> nix::Result<()> {
        killpg(Pid::from_raw(pid as i32), signal)
    }
}
