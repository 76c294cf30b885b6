//! Error types for SmartLog.
//!
//! Network and parse failures stop at the dataset cache. Nothing here is
//! ever surfaced to the operator verbatim; the engine turns every failure
//! into a reply string.

use thiserror::Error;

/// Failures while talking to a remote dataset endpoint
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),

    #[error("Response has no `data` array")]
    MissingData,

    #[error("No endpoint configured")]
    NotConfigured,
}

/// Failures while reading a local fallback file
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Fallback file not configured")]
    NoFallback,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Fallback file is empty")]
    Empty,

    #[error("Malformed row {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}

/// Failures while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Error, Debug)]
pub enum SmartlogError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Data currently unavailable")]
    DataUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SmartlogError {
    pub fn code(&self) -> i32 {
        match self {
            SmartlogError::Transport(_) => -32001,
            SmartlogError::Dataset(_) => -32002,
            SmartlogError::Config(_) => -32003,
            SmartlogError::DataUnavailable => -32004,
            SmartlogError::Internal(_) => -32603,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            SmartlogError::Transport(TransportError::Timeout(5)),
            SmartlogError::Dataset(DatasetError::Empty),
            SmartlogError::DataUnavailable,
            SmartlogError::Internal("x".to_string()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(
            TransportError::Timeout(5).to_string(),
            "Request timeout after 5 seconds"
        );
        assert_eq!(TransportError::Status(503).to_string(), "Endpoint returned HTTP 503");
    }
}
