//! Configuration parsing and validation for peakpause
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Rate and threshold tables validated for completeness at load time
//! - Operator mining policy and temperature source selection
//! - A documented default document persisted when no config exists

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),

    #[error("No rate configured for period '{0}'")]
    MissingRate(RatePeriod),

    #[error("No temperature threshold configured for period '{0}'")]
    MissingThreshold(RatePeriod),

    #[error("Failed to write default config to {path}: {source}")]
    WriteDefault {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// The default configuration document, persisted verbatim on first run.
///
/// Rates are the ULO time-of-use schedule effective Nov 2024 - Oct 2025.
pub const DEFAULT_CONFIG: &str = r#"# peakpause configuration
config_version = 1

[miner]
# Executable to supervise; also the process-table match string.
executable = "./xmrig"
args = ["--config", "./config.json"]
# Miner stdout/stderr are appended here.
log_file = "./xmrig.log"

[sensor]
# Temperature source: "socket", "http", "thermal", or "none".
source = "socket"
socket_addr = "192.168.1.185:48910"
# http_url = "http://homeassistant.local:8123/api/states/sensor.office_temperature"
# http_token = ""
# thermal_zone = "/sys/class/thermal/thermal_zone0/temp"
# Fixed correction added to every reading, in degrees C.
bias = 0.0
timeout_secs = 5

# Electricity rates in cents/kWh.
[rates]
ultra_low = 2.8
weekend_off_peak = 7.6
mid_peak = 12.2
on_peak = 28.4

# Maximum ambient temperature per period, in degrees C. Cheaper periods
# permit higher temperatures.
[thresholds]
ultra_low = 30.0
weekend_off_peak = 28.0
mid_peak = 25.0
on_peak = 20.0

[policy]
# On-peak mining runs only when mine_on_peak is true AND the configured
# on-peak rate meets force_mine_threshold. With the rates above that never
# happens; raise the flag and lower the threshold deliberately.
mine_on_peak = false
force_mine_threshold = 50.0
# Reserved for future profitability checks; currently unused.
min_profit_margin = 1.5

[logging]
level = "info"
"#;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration, creating and persisting the default document first
/// when the file does not exist.
pub fn load_or_init(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let path = path.as_ref();

    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::WriteDefault {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, DEFAULT_CONFIG).map_err(|source| ConfigError::WriteDefault {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Wrote default configuration");
        return parse_config(DEFAULT_CONFIG);
    }

    load_config(path)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Settings> {
    let raw: RawConfig = toml::from_str(content)?;

    // Check version
    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    // Validate
    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}
