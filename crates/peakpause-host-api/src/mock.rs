//! Mock host implementations for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::{HostError, HostResult, MinerHost, TemperatureProvider};

/// Mock miner supervisor for unit/integration testing.
///
/// Tracks a single running/stopped flag plus start/stop counters so tests
/// can assert that a reconcile cycle took (or did not take) an action.
pub struct MockMiner {
    running: Arc<Mutex<bool>>,
    starts: AtomicU32,
    stops: AtomicU32,

    /// Configure start to fail
    pub fail_start: Arc<Mutex<bool>>,

    /// Configure stop to fail
    pub fail_stop: Arc<Mutex<bool>>,
}

impl MockMiner {
    pub fn new() -> Self {
        Self {
            running: Arc::new(Mutex::new(false)),
            starts: AtomicU32::new(0),
            stops: AtomicU32::new(0),
            fail_start: Arc::new(Mutex::new(false)),
            fail_stop: Arc::new(Mutex::new(false)),
        }
    }

    /// Simulate external interference (manual start/kill of the process).
    pub fn set_running(&self, running: bool) {
        *self.running.lock().unwrap() = running;
    }

    /// Number of actual launches performed (idempotent no-ops not counted).
    pub fn start_count(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of actual terminations performed.
    pub fn stop_count(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Default for MockMiner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MinerHost for MockMiner {
    fn scan(&self) -> Vec<u32> {
        if *self.running.lock().unwrap() {
            vec![4242]
        } else {
            Vec::new()
        }
    }

    fn find_miner(&self) -> Option<u32> {
        if *self.running.lock().unwrap() {
            Some(4242)
        } else {
            None
        }
    }

    async fn start(&self) -> HostResult<()> {
        if *self.fail_start.lock().unwrap() {
            return Err(HostError::SpawnFailed("mock start failure".into()));
        }

        let mut running = self.running.lock().unwrap();
        if *running {
            return Ok(());
        }
        *running = true;
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> HostResult<()> {
        if *self.fail_stop.lock().unwrap() {
            return Err(HostError::StopFailed("mock stop failure".into()));
        }

        let mut running = self.running.lock().unwrap();
        if !*running {
            return Ok(());
        }
        *running = false;
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock temperature source with a settable reading.
pub struct MockSensor {
    value: Arc<Mutex<Option<f64>>>,
}

impl MockSensor {
    /// A sensor that always reports `value`.
    pub fn new(value: Option<f64>) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
        }
    }

    /// A sensor that is never available.
    pub fn unavailable() -> Self {
        Self::new(None)
    }

    pub fn set(&self, value: Option<f64>) {
        *self.value.lock().unwrap() = value;
    }
}

#[async_trait]
impl TemperatureProvider for MockSensor {
    async fn read(&self) -> Option<f64> {
        *self.value.lock().unwrap()
    }

    fn source_name(&self) -> &'static str {
        "mock"
    }
}
