//! The decide-and-reconcile controller
//!
//! One [`Controller::run_once`] call per scheduled invocation: classify the
//! current period, evaluate the verdict, and make live process state match
//! it. The controller keeps no state between invocations; every cycle
//! re-derives everything from the clock, the sensor, and the OS process
//! table, so external interference is corrected on the next cycle.

use peakpause_config::{ConfigError, RatePeriod, Settings};
use peakpause_host_api::{HostError, MinerHost, TemperatureProvider};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{classify, evaluate, Verdict};

/// Errors that abort a cycle
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Host(#[from] HostError),
}

pub type ControlResult<T> = Result<T, ControlError>;

/// What the reconcile step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Started,
    Stopped,
    Unchanged,
}

/// Outcome of one decide-and-reconcile cycle
#[derive(Debug)]
pub struct CycleReport {
    pub period: RatePeriod,
    pub rate: f64,
    pub temperature: Option<f64>,
    pub verdict: Verdict,
    pub was_running: bool,
    pub action: ReconcileAction,
}

/// Read-only snapshot for the `status` diagnostic
#[derive(Debug)]
pub struct StatusReport {
    pub period: RatePeriod,
    pub rate: f64,
    pub temperature: Option<f64>,
    pub running: bool,
    pub instance_count: usize,
    pub verdict: Verdict,
}

/// Ties the classifier, evaluator, sensor, and supervisor together.
pub struct Controller {
    settings: Settings,
    sensor: Arc<dyn TemperatureProvider>,
    host: Arc<dyn MinerHost>,
}

impl Controller {
    pub fn new(
        settings: Settings,
        sensor: Arc<dyn TemperatureProvider>,
        host: Arc<dyn MinerHost>,
    ) -> Self {
        Self {
            settings,
            sensor,
            host,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Classify, price, read the sensor, and evaluate. Sensor failures have
    /// already been downgraded to `None` by the provider.
    async fn observe(&self) -> ControlResult<(RatePeriod, f64, Option<f64>, Verdict)> {
        let now = peakpause_util::now();
        let period = classify(&now);
        let rate = self.settings.rates.rate(period)?;
        let temperature = self.sensor.read().await;

        if temperature.is_none() {
            debug!(
                source = self.sensor.source_name(),
                "No temperature reading, conservative policy applies"
            );
        }

        let verdict = evaluate(
            period,
            rate,
            temperature,
            &self.settings.thresholds,
            &self.settings.policy,
        )?;

        Ok((period, rate, temperature, verdict))
    }

    /// Run one decision-and-reconcile cycle.
    ///
    /// Idempotent: a second call under unchanged external conditions takes
    /// no start/stop action.
    pub async fn run_once(&self) -> ControlResult<CycleReport> {
        let (period, rate, temperature, verdict) = self.observe().await?;
        let was_running = self.host.is_running();

        info!(
            period = %period,
            rate,
            temperature = ?temperature,
            should_run = verdict.should_run,
            running = was_running,
            reason = %verdict.reason,
            "Cycle decision"
        );

        let action = match (verdict.should_run, was_running) {
            (true, false) => {
                info!("Starting miner");
                self.host.start().await?;
                ReconcileAction::Started
            }
            (false, true) => {
                info!("Stopping miner");
                self.host.stop().await?;
                ReconcileAction::Stopped
            }
            (true, true) => {
                debug!("Miner continues");
                ReconcileAction::Unchanged
            }
            (false, false) => {
                debug!("Miner remains stopped");
                ReconcileAction::Unchanged
            }
        };

        Ok(CycleReport {
            period,
            rate,
            temperature,
            verdict,
            was_running,
            action,
        })
    }

    /// Operator override: ensure the miner is running regardless of rates,
    /// temperature, or policy. Not a policy branch; nothing is evaluated.
    pub async fn force_start(&self) -> ControlResult<ReconcileAction> {
        if self.host.is_running() {
            info!("FORCE MODE: miner already running");
            return Ok(ReconcileAction::Unchanged);
        }

        info!("FORCE MODE: starting miner regardless of conditions");
        self.host.start().await?;
        Ok(ReconcileAction::Started)
    }

    /// Report what a cycle would decide right now, without reconciling and
    /// without duplicate cleanup.
    pub async fn status(&self) -> ControlResult<StatusReport> {
        let (period, rate, temperature, verdict) = self.observe().await?;
        let instances = self.host.scan();

        Ok(StatusReport {
            period,
            rate,
            temperature,
            running: !instances.is_empty(),
            instance_count: instances.len(),
            verdict,
        })
    }

    /// Stop the miner before the controller exits. Used by continuous mode
    /// on interrupt; failures are logged and surfaced.
    pub async fn shutdown(&self) -> ControlResult<()> {
        if let Err(e) = self.host.stop().await {
            warn!(error = %e, "Failed to stop miner during shutdown");
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peakpause_config::{parse_config, DEFAULT_CONFIG};
    use peakpause_host_api::{MockMiner, MockSensor};

    fn controller_with(
        sensor: MockSensor,
    ) -> (Controller, Arc<MockMiner>) {
        let settings = parse_config(DEFAULT_CONFIG).unwrap();
        let miner = Arc::new(MockMiner::new());
        let controller = Controller::new(settings, Arc::new(sensor), miner.clone());
        (controller, miner)
    }

    #[tokio::test]
    async fn run_once_is_idempotent() {
        let (controller, miner) = controller_with(MockSensor::new(Some(18.0)));

        let first = controller.run_once().await.unwrap();
        let second = controller.run_once().await.unwrap();

        // Whatever the verdict at test time, the second cycle must not add
        // an action on top of the first.
        assert_eq!(second.action, ReconcileAction::Unchanged);
        assert!(miner.start_count() + miner.stop_count() <= 1);
        assert_eq!(second.verdict.should_run, first.verdict.should_run);
    }

    #[tokio::test]
    async fn blocked_verdict_stops_running_miner() {
        // A reading far above every ceiling forces a block in any period.
        let (controller, miner) = controller_with(MockSensor::new(Some(95.0)));
        miner.set_running(true);

        let report = controller.run_once().await.unwrap();
        assert!(!report.verdict.should_run);
        assert!(report.was_running);
        assert_eq!(report.action, ReconcileAction::Stopped);
        assert!(!miner.is_running());
    }

    #[tokio::test]
    async fn blocked_verdict_leaves_stopped_miner_alone() {
        let (controller, miner) = controller_with(MockSensor::new(Some(95.0)));

        let report = controller.run_once().await.unwrap();
        assert_eq!(report.action, ReconcileAction::Unchanged);
        assert_eq!(miner.start_count(), 0);
        assert_eq!(miner.stop_count(), 0);
    }

    #[tokio::test]
    async fn force_start_ignores_conditions() {
        // Hot reading would block any normal cycle.
        let (controller, miner) = controller_with(MockSensor::new(Some(95.0)));

        let action = controller.force_start().await.unwrap();
        assert_eq!(action, ReconcileAction::Started);
        assert!(miner.is_running());

        // Second force is a no-op.
        let action = controller.force_start().await.unwrap();
        assert_eq!(action, ReconcileAction::Unchanged);
        assert_eq!(miner.start_count(), 1);
    }

    #[tokio::test]
    async fn status_reports_without_reconciling() {
        let (controller, miner) = controller_with(MockSensor::new(Some(95.0)));
        miner.set_running(true);

        let status = controller.status().await.unwrap();
        assert!(status.running);
        assert_eq!(status.instance_count, 1);
        assert!(!status.verdict.should_run);

        // status must not have stopped the miner.
        assert!(miner.is_running());
        assert_eq!(miner.stop_count(), 0);
    }

    #[tokio::test]
    async fn start_failure_surfaces_as_host_error() {
        let (controller, miner) = controller_with(MockSensor::new(Some(95.0)));
        *miner.fail_start.lock().unwrap() = true;

        let result = controller.force_start().await;
        assert!(matches!(result, Err(ControlError::Host(_))));
    }

    #[tokio::test]
    async fn shutdown_stops_running_miner() {
        let (controller, miner) = controller_with(MockSensor::unavailable());
        miner.set_running(true);

        controller.shutdown().await.unwrap();
        assert!(!miner.is_running());
    }
}
