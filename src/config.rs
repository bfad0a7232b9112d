use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::plugin::registry::canonical_carrier;

pub const CONFIG_FILE: &str = "carrier-dispatch.yaml";

/// Main carrier-dispatch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    /// Directory for the log file (defaults to the platform data dir)
    pub log_dir: Option<PathBuf>,
    pub tracking: TrackingConfig,
    /// Per-carrier settings keyed by carrier name
    pub carriers: IndexMap<String, CarrierConfig>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Timeout for each upstream lookup, in seconds; 0 disables the per-lookup timeout
    pub timeout_secs: u64,
    /// Upper bound on concurrent lookups within one request
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CarrierConfig {
    pub enabled: bool,
    /// Override for the carrier's API base URL
    pub base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_dir: None,
            tracking: TrackingConfig::default(),
            carriers: IndexMap::from([
                ("correios".to_string(), CarrierConfig::default()),
                ("braspress".to_string(), CarrierConfig::default()),
            ]),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_concurrency: 4,
        }
    }
}

impl TrackingConfig {
    /// Per-lookup timeout, `None` when `timeout_secs` is 0
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Check CARRIER_DISPATCH_CONFIG env var
        if let Ok(env_path) = std::env::var("CARRIER_DISPATCH_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from CARRIER_DISPATCH_CONFIG: {}", e);
                    }
                }
            }
        }

        let candidates = Self::search_paths(
            std::env::var_os("CARRIER_DISPATCH_DIR").map(PathBuf::from),
            dirs::config_dir(),
        );
        if let Some(config) = Self::load_first(&candidates) {
            return Ok(config);
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Remaining fallback locations, in the order they are tried
    fn search_paths(carrier_dispatch_dir: Option<PathBuf>, user_config_dir: Option<PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // CARRIER_DISPATCH_DIR/carrier-dispatch.yaml
        if let Some(dir) = carrier_dispatch_dir {
            paths.push(dir.join(CONFIG_FILE));
        }

        // ~/.config/carrier-dispatch/carrier-dispatch.yaml
        if let Some(dir) = user_config_dir {
            paths.push(dir.join("carrier-dispatch").join(CONFIG_FILE));
        }

        // ./carrier-dispatch.yaml (for development)
        paths.push(PathBuf::from(CONFIG_FILE));
        paths
    }

    /// First existing candidate that parses; broken files are logged and skipped
    fn load_first(paths: &[PathBuf]) -> Option<Self> {
        for path in paths {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(path) {
                Ok(config) => {
                    log::info!("Loaded config from: {}", path.display());
                    return Some(config);
                }
                Err(e) => {
                    log::warn!("Failed to load config from {}: {:#}", path.display(), e);
                }
            }
        }
        None
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    /// Directory the log file is written to
    pub fn log_dir(&self) -> PathBuf {
        match &self.log_dir {
            Some(dir) => Self::expand_path(dir),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("carrier-dispatch")
                .join("logs"),
        }
    }

    /// Settings for a carrier, matched on its canonical name
    pub fn carrier(&self, name: &str) -> CarrierConfig {
        let key = canonical_carrier(name);
        self.carriers
            .iter()
            .find(|(k, _)| canonical_carrier(k) == key)
            .map(|(_, c)| c.clone())
            .unwrap_or_default()
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}
