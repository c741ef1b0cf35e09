//! Host adapter traits

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from host adapter operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Stop failed: {0}")]
    StopFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Grace period between the graceful-termination signal and the
/// unconditional kill during [`MinerHost::stop`]. The miner may need the
/// window to flush state; the forced step guarantees termination even when
/// the process is unresponsive.
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Supervision seam for the controlled miner process.
///
/// Implementations observe the OS process table rather than tracking state
/// internally: the supervisor may be restarted at any time and must not
/// assume it spawned the process it controls. Every operation is idempotent
/// under repeated invocation.
#[async_trait]
pub trait MinerHost: Send + Sync {
    /// Pids of every live instance of the controlled executable, sorted
    /// ascending. Pure observation: no cleanup, no signals. Used by the
    /// read-only `status` diagnostic.
    fn scan(&self) -> Vec<u32>;

    /// Find the canonical miner instance, if any.
    ///
    /// When more than one instance of the controlled executable exists, the
    /// first match (lowest pid) is canonical and every other match receives
    /// a best-effort termination signal before the canonical pid is
    /// returned.
    fn find_miner(&self) -> Option<u32>;

    /// True iff a miner instance is currently alive.
    fn is_running(&self) -> bool {
        self.find_miner().is_some()
    }

    /// Ensure the miner is running. No-op returning success when an
    /// instance already exists. Launch failures are reported, not retried.
    async fn start(&self) -> HostResult<()>;

    /// Ensure the miner is stopped. No-op returning success when no
    /// instance exists. Otherwise: graceful signal, [`STOP_GRACE_PERIOD`],
    /// then unconditional kill ("already gone" counts as success).
    async fn stop(&self) -> HostResult<()>;
}

/// A source of ambient temperature readings.
///
/// Absence is a first-class outcome, not an error: implementations convert
/// every network, parsing, and timeout failure into `None` plus a logged
/// warning, and never block longer than a few seconds.
#[async_trait]
pub trait TemperatureProvider: Send + Sync {
    /// Current reading in °C with the configured bias already applied, or
    /// `None` when the source is unavailable.
    async fn read(&self) -> Option<f64>;

    /// Short name of the source for log lines ("socket", "http", ...).
    fn source_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grace_period_is_two_seconds() {
        assert_eq!(STOP_GRACE_PERIOD, Duration::from_secs(2));
    }
}
