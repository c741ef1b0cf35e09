//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::settings::RatePeriod;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Controlled miner process
    #[serde(default)]
    pub miner: RawMinerConfig,

    /// Temperature source selection
    #[serde(default)]
    pub sensor: RawSensorConfig,

    /// Electricity rate per period, in ¢/kWh
    #[serde(default)]
    pub rates: HashMap<RatePeriod, f64>,

    /// Maximum ambient temperature per period, in °C
    #[serde(default)]
    pub thresholds: HashMap<RatePeriod, f64>,

    /// Operator mining policy
    #[serde(default)]
    pub policy: RawPolicyConfig,

    /// Controller logging
    #[serde(default)]
    pub logging: RawLoggingConfig,
}

/// Miner process settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMinerConfig {
    /// Executable to supervise. Also the process-table match string.
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Arguments passed on launch
    #[serde(default = "default_miner_args")]
    pub args: Vec<String>,

    /// Miner stdout/stderr are appended here
    #[serde(default = "default_miner_log")]
    pub log_file: PathBuf,
}

impl Default for RawMinerConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            args: default_miner_args(),
            log_file: default_miner_log(),
        }
    }
}

fn default_executable() -> String {
    "./xmrig".to_string()
}

fn default_miner_args() -> Vec<String> {
    vec!["--config".to_string(), "./config.json".to_string()]
}

fn default_miner_log() -> PathBuf {
    PathBuf::from("./xmrig.log")
}

/// Temperature source settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSensorConfig {
    /// One of "socket", "http", "thermal", "none"
    #[serde(default = "default_source")]
    pub source: String,

    /// host:port of the TCP temperature server (source = "socket")
    pub socket_addr: Option<String>,

    /// Endpoint returning JSON or a bare number (source = "http")
    pub http_url: Option<String>,

    /// Optional bearer token for the HTTP endpoint
    pub http_token: Option<String>,

    /// sysfs thermal zone file (source = "thermal")
    pub thermal_zone: Option<PathBuf>,

    /// Fixed correction added to every reading, in °C
    #[serde(default)]
    pub bias: f64,

    /// Read timeout in seconds
    #[serde(default = "default_sensor_timeout")]
    pub timeout_secs: u64,
}

impl Default for RawSensorConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            socket_addr: None,
            http_url: None,
            http_token: None,
            thermal_zone: None,
            bias: 0.0,
            timeout_secs: default_sensor_timeout(),
        }
    }
}

fn default_source() -> String {
    "socket".to_string()
}

fn default_sensor_timeout() -> u64 {
    5
}

/// Operator policy flags
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPolicyConfig {
    /// Whether on-peak operation is ever allowed
    #[serde(default)]
    pub mine_on_peak: bool,

    /// Rate (¢/kWh) the on-peak rate must meet before on-peak mining is
    /// permitted, even with mine_on_peak = true
    #[serde(default = "default_force_threshold")]
    pub force_mine_threshold: f64,

    /// Minimum profit margin ratio. Parsed for forward compatibility;
    /// the current decision logic never reads it.
    #[serde(default = "default_min_profit_margin")]
    pub min_profit_margin: f64,
}

impl Default for RawPolicyConfig {
    fn default() -> Self {
        Self {
            mine_on_peak: false,
            force_mine_threshold: default_force_threshold(),
            min_profit_margin: default_min_profit_margin(),
        }
    }
}

fn default_force_threshold() -> f64 {
    50.0
}

fn default_min_profit_margin() -> f64 {
    1.5
}

/// Controller logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLoggingConfig {
    /// Default tracing filter level ("trace".."error")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for RawLoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
