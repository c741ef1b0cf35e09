//! Core decision engine for peakpause
//!
//! Three layers, each pure with respect to the one below:
//! - [`classify`]: timestamp -> rate period (no I/O)
//! - [`evaluate`]: period + rate + temperature + policy -> [`Verdict`]
//! - [`Controller`]: one decide-and-reconcile cycle over the host seams

mod controller;
mod evaluate;
mod schedule;

pub use controller::*;
pub use evaluate::*;
pub use schedule::*;
