//! Host interfaces for peakpause
//!
//! The decision engine only ever talks to the outside world through two
//! seams: [`MinerHost`] (OS process supervision) and [`TemperatureProvider`]
//! (ambient temperature). Mock implementations for tests live in
//! [`mock`] and are re-exported.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
