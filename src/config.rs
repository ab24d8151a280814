//! Pipeline configuration
//!
//! TOML-backed settings resolved through a discovery hierarchy:
//! explicit file path, then the `STAGEHAND_CONFIG` environment variable,
//! then `~/.config/stagehand/config.toml`. A missing file is not an
//! error; defaults apply.
//!
//! The loaded configuration is installed process-wide so the data model
//! can resolve the identifier key name indirectly instead of assuming a
//! literal.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Deserialize;

use crate::plugin::error::{PluginError, PluginResult};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "STAGEHAND_CONFIG";

/// Pipeline settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the instance metadata key marking pipeline-visible
    /// instances. Core logic reads this key name through the installed
    /// configuration, never as a literal.
    pub identifier_key: String,

    /// Plugin definition locations to register up front
    pub plugin_paths: Vec<PathBuf>,

    /// Log level for `logging::init_from_config`
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identifier_key: "publishable".to_string(),
            plugin_paths: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration using the discovery hierarchy
    pub fn load() -> PluginResult<Self> {
        debug!("Starting configuration discovery");

        for path in discover_config_files() {
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
                return Self::load_from_file(path);
            }
            debug!("No configuration at: {}", path.display());
        }

        info!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from an explicit file path
    pub fn load_from_file(path: PathBuf) -> PluginResult<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            PluginError::configuration_error(format!(
                "Failed to read config file {}: {}", path.display(), e
            ))
        })?;

        Self::parse(&content).map_err(|e| {
            PluginError::configuration_error(format!(
                "Failed to parse config file {}: {}", path.display(), e
            ))
        })
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Candidate configuration file locations, highest priority first
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(explicit) = env::var(CONFIG_ENV_VAR) {
        paths.push(PathBuf::from(explicit));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(
            home_dir
                .join(".config")
                .join("stagehand")
                .join("config.toml"),
        );
    }

    paths
}

/// Default location for user plugin definitions
pub fn default_plugin_directory() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("stagehand").join("plugins"))
}

static CURRENT: Lazy<RwLock<Arc<Config>>> =
    Lazy::new(|| RwLock::new(Arc::new(Config::default())));

/// Install `config` as the process-wide current configuration
pub fn install(config: Config) {
    *CURRENT.write() = Arc::new(config);
}

/// The process-wide current configuration
pub fn current() -> Arc<Config> {
    CURRENT.read().clone()
}

/// The configured identifier key name
pub fn identifier_key() -> String {
    current().identifier_key.clone()
}
