//! Linux host implementations for peakpause
//!
//! [`MinerSupervisor`] makes OS process state match the controller's
//! verdicts; the sensor module provides the socket, HTTP, and sysfs
//! temperature adapters behind the `TemperatureProvider` seam.

mod process;
mod sensor;
mod supervisor;

pub use process::*;
pub use sensor::*;
pub use supervisor::*;
