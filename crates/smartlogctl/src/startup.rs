//! Process startup: configuration and tracing

use anyhow::{Context, Result};
use smartlog_common::config::discover_config_path;
use smartlog_common::SmartlogConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Load configuration from `--config`, or the discovered path, or defaults
pub fn load_config(explicit: Option<&Path>) -> Result<SmartlogConfig> {
    match explicit {
        Some(path) => SmartlogConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => SmartlogConfig::load().context("Failed to load config"),
    }
}

/// Path the configuration was (or would be) read from
pub fn config_source(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(discover_config_path)
}

/// Human-readable log lines on stderr. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &SmartlogConfig) {
    let level = config.log.level.clone();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second init (tests) is not an error worth reporting
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
