//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "crowbar.toml",
    "./config/config.toml",
    "/etc/crowbar/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) but reads overrides through `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup);
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured file does not exist, searching defaults");
        }

        if let Some(path) = lookup("CROWBAR_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `CROWBAR_*` overrides. Unparsable numeric values are ignored.
fn apply_overrides<F>(config: &mut AppConfig, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    // Database
    if let Some(val) = lookup("CROWBAR_DATABASE_URL") {
        config.database.url = val;
    }
    if let Some(val) = lookup("CROWBAR_DATABASE_MAX_CONNECTIONS") {
        if let Ok(max) = val.parse() {
            config.database.max_connections = max;
        }
    }
    if let Some(val) = lookup("CROWBAR_DATABASE_BUSY_TIMEOUT_MS") {
        if let Ok(timeout) = val.parse() {
            config.database.busy_timeout_ms = timeout;
        }
    }

    // Logging
    if let Some(val) = lookup("CROWBAR_LOG_FORMAT") {
        match val.parse() {
            Ok(format) => config.logging.format = format,
            Err(e) => warn!(error = %e, "Ignoring CROWBAR_LOG_FORMAT"),
        }
    }
    if let Some(val) = lookup("CROWBAR_LOG_FILTER") {
        config.logging.filter = val;
    }

    // General
    if let Some(val) = lookup("CROWBAR_DEV_MODE") {
        match parse_flag(&val) {
            Some(flag) => config.dev_mode = flag,
            None => warn!(value = %val, "Ignoring CROWBAR_DEV_MODE, not a boolean"),
        }
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
