//! Query transcript
//!
//! One JSON line per answered query, appended to an XDG state file. Enabled
//! with `[log] transcript = true`. Write failures are logged and otherwise
//! ignored; stdout belongs to the replies.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment override for the transcript location
pub const LOG_FILE_ENV: &str = "SMARTLOG_LOG_FILE";

/// One answered query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    /// RFC 3339 timestamp
    pub ts: String,

    /// Request ID (UUID)
    pub req_id: String,

    pub query: String,

    pub reply: String,

    pub duration_ms: u64,

    /// False when the reply is a degraded one (data unavailable, system error)
    pub ok: bool,
}

impl QueryLogEntry {
    pub fn new(query: &str, reply: &str, duration: Duration, ok: bool) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339(),
            req_id: uuid::Uuid::new_v4().to_string(),
            query: query.to_string(),
            reply: reply.to_string(),
            duration_ms: duration.as_millis() as u64,
            ok,
        }
    }

    /// Append to `path`, creating parent directories as needed
    pub fn write_to(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Discover the transcript path
///
/// Priority:
/// 1. $SMARTLOG_LOG_FILE (explicit override)
/// 2. $XDG_STATE_HOME/smartlog/queries.jsonl
/// 3. ~/.local/state/smartlog/queries.jsonl
pub fn discover_log_path() -> Option<PathBuf> {
    discover_log_path_with(|key| std::env::var(key).ok())
}

/// Same chain over an arbitrary environment lookup
pub fn discover_log_path_with<F>(env: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = env(LOG_FILE_ENV) {
        return Some(PathBuf::from(path));
    }

    if let Some(xdg_state) = env("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg_state).join("smartlog").join("queries.jsonl"));
    }

    env("HOME").map(|home| {
        PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("smartlog")
            .join("queries.jsonl")
    })
}

/// Transcript sink; a disabled one drops every entry
#[derive(Debug, Clone)]
pub struct Transcript {
    path: Option<PathBuf>,
}

impl Transcript {
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Enabled at the discovered path when `enabled` is set
    pub fn from_config(enabled: bool) -> Self {
        if !enabled {
            return Self::disabled();
        }
        match discover_log_path() {
            Some(path) => Self::to_path(path),
            None => {
                tracing::warn!("Transcript enabled but no state directory found");
                Self::disabled()
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, query: &str, reply: &str, duration: Duration, ok: bool) {
        let Some(path) = &self.path else {
            return;
        };
        let entry = QueryLogEntry::new(query, reply, duration, ok);
        if let Err(e) = entry.write_to(path) {
            tracing::warn!("Failed to write transcript {}: {}", path.display(), e);
        }
    }
}
