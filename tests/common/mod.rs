#![allow(dead_code)]

pub use chainwatch_test_utils::builders;
pub use chainwatch_test_utils::fake_backend;
pub use chainwatch_test_utils::{init_tracing, wait_until, with_timeout};

use chainwatch::types::CommandSpec;

/// Parse a command line, panicking on empty input.
pub fn cmd(line: &str) -> CommandSpec {
    line.parse().expect("test command line must name a program")
}
