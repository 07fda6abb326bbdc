// src/engine/mod.rs

//! Orchestration engine for chainwatch.
//!
//! This module ties together:
//! - the watch-state core that turns filesystem events into rebuild
//!   decisions ([`core`]),
//! - the "currently active chain" shared between the control loop and the
//!   chain tasks ([`run_state`]),
//! - the control loop reacting to events, watch errors and shutdown
//!   ([`runtime`]).

use std::fmt;
use std::path::PathBuf;

/// Why a rebuild was triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerReason {
    /// Baseline run after the initial walk.
    Initial,
    /// A file appeared or its modification time moved.
    Changed(PathBuf),
    /// A path disappeared.
    Removed(PathBuf),
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerReason::Initial => f.write_str("initial"),
            TriggerReason::Changed(p) => write!(f, "changed {}", p.display()),
            TriggerReason::Removed(p) => write!(f, "removed {}", p.display()),
        }
    }
}

pub mod core;
pub mod run_state;
pub mod runtime;

pub use core::WatchCore;
pub use run_state::{RunId, RunState};
pub use runtime::{Runtime, ShutdownHandle};
