//! SmartLog configuration
//!
//! Lives in `~/.config/smartlog/config.toml` unless `$SMARTLOG_CONFIG` or an
//! explicit path says otherwise. Every field has a default so a partial file
//! (or no file at all) still yields a working setup.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR_NAME: &str = "smartlog";
const CONFIG_FILE: &str = "config.toml";

/// Environment override for the config file location
pub const CONFIG_ENV: &str = "SMARTLOG_CONFIG";

/// Parts / stock dataset source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartsSourceConfig {
    /// Remote endpoint returning `{"data": [{...}, ...]}`
    #[serde(default = "default_parts_url")]
    pub url: String,

    /// Local delimited file used when the endpoint fails
    #[serde(default = "default_parts_fallback")]
    pub fallback_file: Option<PathBuf>,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Serve the built-in sample rows when every source fails
    #[serde(default = "default_sample_fallback")]
    pub sample_fallback: bool,
}

fn default_parts_url() -> String {
    "http://10.64.6.27/legion/all_data_dock43.php".to_string()
}

fn default_parts_fallback() -> Option<PathBuf> {
    Some(PathBuf::from("data/master_parts.csv"))
}

fn default_delimiter() -> char {
    ';'
}

fn default_ttl() -> u64 {
    30
}

fn default_timeout() -> u64 {
    5
}

fn default_sample_fallback() -> bool {
    true
}

impl Default for PartsSourceConfig {
    fn default() -> Self {
        Self {
            url: default_parts_url(),
            fallback_file: default_parts_fallback(),
            delimiter: default_delimiter(),
            ttl_secs: default_ttl(),
            timeout_secs: default_timeout(),
            sample_fallback: default_sample_fallback(),
        }
    }
}

/// Positions of the named fields inside a positional delivery row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryColumns {
    #[serde(default = "default_col_dock")]
    pub dock: usize,
    #[serde(default = "default_col_supplier")]
    pub supplier: usize,
    #[serde(default = "default_col_route")]
    pub route: usize,
    #[serde(default = "default_col_cycle")]
    pub cycle: usize,
    #[serde(default = "default_col_scheduled")]
    pub scheduled_arrival: usize,
    #[serde(default = "default_col_actual")]
    pub actual_arrival: usize,
    #[serde(default = "default_col_status")]
    pub status: usize,
}

fn default_col_dock() -> usize {
    0
}

fn default_col_supplier() -> usize {
    1
}

fn default_col_route() -> usize {
    2
}

fn default_col_cycle() -> usize {
    3
}

fn default_col_scheduled() -> usize {
    5
}

fn default_col_actual() -> usize {
    6
}

fn default_col_status() -> usize {
    8
}

impl Default for DeliveryColumns {
    fn default() -> Self {
        Self {
            dock: default_col_dock(),
            supplier: default_col_supplier(),
            route: default_col_route(),
            cycle: default_col_cycle(),
            scheduled_arrival: default_col_scheduled(),
            actual_arrival: default_col_actual(),
            status: default_col_status(),
        }
    }
}

/// Delivery / route-status dataset source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverySourceConfig {
    /// Remote endpoint returning `{"data": [[...], ...]}`
    #[serde(default = "default_delivery_url")]
    pub url: String,

    /// Optional local delimited file with a header row
    #[serde(default)]
    pub fallback_file: Option<PathBuf>,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub columns: DeliveryColumns,
}

fn default_delivery_url() -> String {
    "http://10.64.6.27/legion/dcl_monitoring_dock43.php".to_string()
}

impl Default for DeliverySourceConfig {
    fn default() -> Self {
        Self {
            url: default_delivery_url(),
            fallback_file: None,
            delimiter: default_delimiter(),
            ttl_secs: default_ttl(),
            timeout_secs: default_timeout(),
            columns: DeliveryColumns::default(),
        }
    }
}

/// Intent classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Enable the typo-tolerant scorer after the keyword table finds nothing
    #[serde(default)]
    pub fuzzy_enabled: bool,

    /// Minimum score (0-100) for a fuzzy field match
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: u32,
}

fn default_fuzzy_threshold() -> u32 {
    60
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            fuzzy_enabled: false,
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

impl IntentConfig {
    pub fn effective_threshold(&self) -> u32 {
        self.fuzzy_threshold.min(100)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append every query and reply to the JSONL transcript
    #[serde(default)]
    pub transcript: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            transcript: false,
        }
    }
}

/// Complete SmartLog configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SmartlogConfig {
    #[serde(default)]
    pub parts: PartsSourceConfig,

    #[serde(default)]
    pub delivery: DeliverySourceConfig,

    #[serde(default)]
    pub intent: IntentConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Clamp a cache TTL to 1s..=1h
pub fn effective_ttl(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(1, 3600))
}

/// Clamp a request timeout to 1s..=60s
pub fn effective_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(1, 60))
}

impl SmartlogConfig {
    /// Load from an explicit file. A missing or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load from `$SMARTLOG_CONFIG` or the user config dir, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        match discover_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// Config path discovery: `$SMARTLOG_CONFIG`, then `<config_dir>/smartlog/config.toml`
pub fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE))
}
