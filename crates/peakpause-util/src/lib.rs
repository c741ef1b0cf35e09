//! Shared utilities for the peakpause workspace.

mod paths;
mod time;

pub use paths::*;
pub use time::*;
