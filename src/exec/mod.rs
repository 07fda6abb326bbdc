// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`process`] runs one command with `tokio::process::Command`, captures
//!   its combined output and supports polite termination.
//! - [`chain`] runs an ordered list of commands with halt-on-failure and
//!   cooperative cancellation.
//! - [`sink`] defines where status markers and output go.

pub mod chain;
pub mod process;
pub mod sink;

pub use chain::{ChainBuilder, ChainError, ChainResult, CommandChain};
pub use process::{KillPolicy, ProcessHandle, StepOutcome};
pub use sink::{BufferSink, OutputSink, StdoutSink};
