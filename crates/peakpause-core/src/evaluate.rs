//! Policy evaluation
//!
//! Combines the rate period, the configured rate, an optional temperature
//! reading, per-period temperature ceilings, and the operator policy into
//! a run/no-run [`Verdict`].

use peakpause_config::{ConfigError, MiningPolicy, RatePeriod, TempThresholds};

/// The run/no-run decision for one evaluation cycle, with its
/// human-readable justification. Produced fresh on every evaluation and
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub should_run: bool,
    pub reason: String,
}

impl Verdict {
    fn approve(reason: String) -> Self {
        Self {
            should_run: true,
            reason,
        }
    }

    fn block(reason: String) -> Self {
        Self {
            should_run: false,
            reason,
        }
    }
}

/// Evaluate whether the miner should run.
///
/// Decision order:
/// 1. Without a temperature reading, approve only during ultra-low: absence
///    of thermal feedback defaults to the cheapest-period-only behavior.
/// 2. A reading above the period's ceiling blocks regardless of rate or
///    policy.
/// 3. On-peak is blocked unless `mine_on_peak` is set AND the configured
///    rate meets `force_mine_threshold` (see [`MiningPolicy`] for why that
///    combination may be unreachable).
/// 4. Otherwise approve.
///
/// `min_profit_margin` is deliberately never consulted. Only the threshold
/// lookup can fail, and only for tables missing a period entry.
pub fn evaluate(
    period: RatePeriod,
    rate: f64,
    reading: Option<f64>,
    thresholds: &TempThresholds,
    policy: &MiningPolicy,
) -> Result<Verdict, ConfigError> {
    let temp = match reading {
        None => {
            return Ok(if period == RatePeriod::UltraLow {
                Verdict::approve(format!(
                    "mining approved: {period} at {rate}\u{a2}/kWh (no temperature sensor, ultra-low-only policy)"
                ))
            } else {
                Verdict::block(format!(
                    "mining blocked: {period} at {rate}\u{a2}/kWh (no temperature sensor, ultra-low-only policy)"
                ))
            });
        }
        Some(temp) => temp,
    };

    let ceiling = thresholds.ceiling(period)?;
    if temp > ceiling {
        return Ok(Verdict::block(format!(
            "temperature too high: {temp:.1}\u{b0}C > {ceiling:.1}\u{b0}C for {period}"
        )));
    }

    if period == RatePeriod::OnPeak {
        if !policy.mine_on_peak {
            return Ok(Verdict::block(format!(
                "on-peak period blocked by policy: {rate}\u{a2}/kWh"
            )));
        }

        // Guard against stale or misconfigured rate tables: on-peak runs
        // only when the configured rate meets the force threshold.
        if rate < policy.force_mine_threshold {
            return Ok(Verdict::block(format!(
                "on-peak rate {rate}\u{a2}/kWh below force threshold {}\u{a2}/kWh",
                policy.force_mine_threshold
            )));
        }
    }

    Ok(Verdict::approve(format!(
        "mining approved: {period} at {rate}\u{a2}/kWh, temp {temp:.1}\u{b0}C"
    )))
}
