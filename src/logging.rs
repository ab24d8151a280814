//! Logging setup
//!
//! Structured text logging on stderr with `YYYY-MM-DD HH:mm:ss [LEVEL]`
//! timestamp formatting. Library code logs through the `log` facade only;
//! embedding applications call [`init`] once, or install their own logger.

use std::io::Write;

use chrono::Local;
use log::LevelFilter;

use crate::config::Config;
use crate::plugin::error::{PluginError, PluginResult};

/// Initialize the logging system at the given level
///
/// Returns an error if a global logger is already installed.
pub fn init(level: LevelFilter) -> PluginResult<()> {
    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level().to_string().to_uppercase(),
                record.args()
            )
        })
        .try_init()
        .map_err(|e| PluginError::configuration_error(format!("Failed to set logger: {}", e)))
}

/// Initialize logging from a loaded configuration
pub fn init_from_config(config: &Config) -> PluginResult<()> {
    init(parse_log_level(&config.log_level)?)
}

/// Convert a level string to a LevelFilter
pub fn parse_log_level(level_str: &str) -> PluginResult<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(PluginError::configuration_error(format!(
            "Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off",
            level_str
        ))),
    }
}
