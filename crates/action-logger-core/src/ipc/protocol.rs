//! Wire protocol spoken with the logging daemon
//!
//! One newline-terminated JSON command `{action, data}` per connection,
//! answered by a single JSON object `{ok, message?, error?}`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Deliver one event (data = the event)
    AddLog,
    /// Fetch recent records (data = `{limit}`)
    GetLogs,
}

/// Request envelope
#[derive(Debug, Serialize)]
pub struct Command<'a, T: Serialize> {
    pub action: Action,
    pub data: &'a T,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetLogsParams {
    pub limit: i64,
}

/// Response envelope; transport failures are folded into `ok: false`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DaemonResponse {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: None,
            error: Some(reason.into()),
        }
    }

    /// Reason for a failed response, for display
    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown daemon error")
    }
}

/// Local channel address of the daemon: a filesystem socket on Unix, a named pipe on Windows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(PathBuf);

impl Endpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Derive the well-known address from a channel name
    #[cfg(windows)]
    pub fn from_channel(name: &str) -> Self {
        Self(PathBuf::from(format!(r"\\.\pipe\{}", name)))
    }

    /// Derive the well-known address from a channel name
    #[cfg(not(windows))]
    pub fn from_channel(name: &str) -> Self {
        Self(Path::new("/tmp").join(name))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serialization() {
        let params = GetLogsParams { limit: 5 };
        let command = Command {
            action: Action::GetLogs,
            data: &params,
        };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#"{"action":"GET_LOGS","data":{"limit":5}}"#);

        let json = serde_json::to_string(&Action::AddLog).unwrap();
        assert_eq!(json, r#""ADD_LOG""#);
    }

    #[test]
    fn test_response_defaults() {
        let resp: DaemonResponse = serde_json::from_str("{}").unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error_text(), "unknown daemon error");

        let resp: DaemonResponse =
            serde_json::from_str(r#"{"ok":true,"message":{"count":0,"logs":[]}}"#).unwrap();
        assert!(resp.ok);
        assert_eq!(resp.message.unwrap()["count"], 0);
    }

    #[test]
    fn test_failure_response() {
        let resp = DaemonResponse::failure("refused");
        assert!(!resp.ok);
        assert_eq!(resp.error_text(), "refused");
    }

    #[cfg(unix)]
    #[test]
    fn test_endpoint_from_channel() {
        let endpoint = Endpoint::from_channel("cccore_socket");
        assert_eq!(endpoint.as_path(), Path::new("/tmp/cccore_socket"));
        assert_eq!(endpoint.to_string(), "/tmp/cccore_socket");
    }
}
