//! Configuration validation

use crate::schema::RawConfig;
use crate::settings::RatePeriod;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("No rate configured for period '{0}'")]
    MissingRate(RatePeriod),

    #[error("No temperature threshold configured for period '{0}'")]
    MissingThreshold(RatePeriod),

    #[error("Rate for period '{period}' must be positive, got {value}")]
    NonPositiveRate { period: RatePeriod, value: f64 },

    #[error("Miner executable cannot be empty")]
    EmptyExecutable,

    #[error("Unknown temperature source '{0}' (expected socket, http, thermal, or none)")]
    UnknownSensorSource(String),

    #[error("Temperature source '{source_name}' requires '{field}' to be set")]
    MissingSensorEndpoint {
        source_name: String,
        field: &'static str,
    },

    #[error("Sensor timeout must be non-zero")]
    ZeroSensorTimeout,

    #[error("Policy field '{field}' must be positive, got {value}")]
    NonPositivePolicyValue { field: &'static str, value: f64 },
}

/// Validate a raw configuration.
///
/// Rate and threshold tables must carry an entry for every period; the
/// convention that thresholds are non-increasing in rate is deliberately
/// not enforced.
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for period in RatePeriod::ALL {
        match config.rates.get(&period) {
            None => errors.push(ValidationError::MissingRate(period)),
            Some(&value) if value <= 0.0 => {
                errors.push(ValidationError::NonPositiveRate { period, value });
            }
            Some(_) => {}
        }

        if !config.thresholds.contains_key(&period) {
            errors.push(ValidationError::MissingThreshold(period));
        }
    }

    if config.miner.executable.trim().is_empty() {
        errors.push(ValidationError::EmptyExecutable);
    }

    errors.extend(validate_sensor(config));

    if config.policy.force_mine_threshold <= 0.0 {
        errors.push(ValidationError::NonPositivePolicyValue {
            field: "force_mine_threshold",
            value: config.policy.force_mine_threshold,
        });
    }

    if config.policy.min_profit_margin <= 0.0 {
        errors.push(ValidationError::NonPositivePolicyValue {
            field: "min_profit_margin",
            value: config.policy.min_profit_margin,
        });
    }

    errors
}

fn validate_sensor(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let sensor = &config.sensor;

    match sensor.source.as_str() {
        "socket" => {
            if sensor.socket_addr.is_none() {
                errors.push(ValidationError::MissingSensorEndpoint {
                    source_name: "socket".into(),
                    field: "socket_addr",
                });
            }
        }
        "http" => {
            if sensor.http_url.as_deref().unwrap_or("").is_empty() {
                errors.push(ValidationError::MissingSensorEndpoint {
                    source_name: "http".into(),
                    field: "http_url",
                });
            }
        }
        // Thermal zone has a default path; "none" needs nothing.
        "thermal" | "none" => {}
        other => errors.push(ValidationError::UnknownSensorSource(other.to_string())),
    }

    if sensor.timeout_secs == 0 {
        errors.push(ValidationError::ZeroSensorTimeout);
    }

    errors
}
