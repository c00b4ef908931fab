use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ipc::Endpoint;

/// Environment variable that overrides `general.log_dir`
pub const LOG_DIR_ENV: &str = "ACTION_LOGGER_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding the daily `YYYY-MM-DD.log` files
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Diagnostic log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Write diagnostics to `<dir>/<YYYY-MM-DD>.log` instead of stderr
    #[serde(default)]
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_level: default_log_level(),
            diagnostics_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Channel name the daemon endpoint is derived from
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
    /// Explicit endpoint path, bypassing the channel name derivation
    #[serde(default)]
    pub socket_path: Option<PathBuf>,
    /// Wait budget for delivering a single event
    #[serde(default = "default_record_timeout")]
    pub record_timeout_ms: u64,
    /// Wait budget for a history query
    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            channel_name: default_channel_name(),
            socket_path: None,
            record_timeout_ms: default_record_timeout(),
            query_timeout_ms: default_query_timeout(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("action-logger")
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_channel_name() -> String {
    "cccore_socket".to_string()
}

fn default_record_timeout() -> u64 {
    1500
}

fn default_query_timeout() -> u64 {
    3000
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file (or defaults), then apply `ACTION_LOGGER_PATH`
    pub fn load() -> crate::Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_log_dir_override(std::env::var(LOG_DIR_ENV).ok());
        Ok(config)
    }

    /// Load configuration from an explicit file, falling back to defaults if it is missing
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Replace the log directory when the override is set and non-empty
    pub fn apply_log_dir_override(&mut self, value: Option<String>) {
        if let Some(dir) = value.filter(|v| !v.trim().is_empty()) {
            self.general.log_dir = PathBuf::from(dir);
        }
    }

    /// Get the configuration file path
    /// Always uses ~/.config/action-logger/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("action-logger")
            .join("config.toml")
    }

    /// Get the log directory (with tilde expansion)
    pub fn log_dir(&self) -> PathBuf {
        expand_tilde(&self.general.log_dir)
    }

    pub fn diagnostics_dir(&self) -> Option<PathBuf> {
        self.general.diagnostics_dir.as_deref().map(expand_tilde)
    }

    /// Daemon endpoint: the explicit socket path if configured, otherwise derived from the channel name
    pub fn endpoint(&self) -> Endpoint {
        match &self.daemon.socket_path {
            Some(path) => Endpoint::new(expand_tilde(path)),
            None => Endpoint::from_channel(&self.daemon.channel_name),
        }
    }

    pub fn record_timeout(&self) -> Duration {
        Duration::from_millis(self.daemon.record_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.daemon.query_timeout_ms)
    }
}
