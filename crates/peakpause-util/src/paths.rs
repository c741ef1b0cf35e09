//! Default paths for peakpause
//!
//! Config lives in a user-writable location (no root required):
//! `$XDG_CONFIG_HOME/peakpause/peakpause.toml` or
//! `~/.config/peakpause/peakpause.toml`.

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const PEAKPAUSE_CONFIG_ENV: &str = "PEAKPAUSE_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "peakpause.toml";

/// Application subdirectory name
const APP_DIR: &str = "peakpause";

/// Default config file path, XDG_CONFIG_HOME first, then ~/.config.
/// The `PEAKPAUSE_CONFIG` override is handled by the CLI layer, not here.
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join(CONFIG_FILENAME)
}
