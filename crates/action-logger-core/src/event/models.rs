use std::collections::BTreeMap;

use chrono::{Local, TimeZone, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

pub const SOURCE_CLAUDE_CODE: &str = "Claude Code";
pub const SOURCE_CHROME: &str = "Chrome";
pub const SOURCE_CLI: &str = "CLI";

/// Display format of the TIMESTAMP header (local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where an event came from, with the attributes that source carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    ClaudeCode {
        workspace: String,
        session_id: String,
    },
    Chrome {
        tab_id: String,
    },
    Cli {
        pid: String,
    },
    /// Unrecognised source; header keys other than source/timestamp are kept as-is
    Other {
        source: String,
        attributes: BTreeMap<String, String>,
    },
}

impl Origin {
    pub fn source(&self) -> &str {
        match self {
            Origin::ClaudeCode { .. } => SOURCE_CLAUDE_CODE,
            Origin::Chrome { .. } => SOURCE_CHROME,
            Origin::Cli { .. } => SOURCE_CLI,
            Origin::Other { source, .. } => source,
        }
    }

    /// Build an origin from lowercase header/JSON keys.
    ///
    /// Keys are expected lowercased (`sessionid`, `tabid`), which is how the
    /// codec recovers them; consumed keys are removed from `fields`.
    pub fn from_fields(source: &str, mut fields: BTreeMap<String, String>) -> Self {
        match source {
            SOURCE_CLAUDE_CODE => Origin::ClaudeCode {
                workspace: fields.remove("workspace").unwrap_or_default(),
                session_id: fields.remove("sessionid").unwrap_or_default(),
            },
            SOURCE_CHROME => Origin::Chrome {
                tab_id: fields.remove("tabid").unwrap_or_default(),
            },
            SOURCE_CLI => Origin::Cli {
                pid: fields.remove("pid").unwrap_or_default(),
            },
            other => Origin::Other {
                source: other.to_string(),
                attributes: fields,
            },
        }
    }

    /// Source-specific header lines as (NAME, value) pairs; empty for unrecognised sources
    pub fn header_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Origin::ClaudeCode {
                workspace,
                session_id,
            } => vec![("WORKSPACE", workspace), ("SESSIONID", session_id)],
            Origin::Chrome { tab_id } => vec![("TABID", tab_id)],
            Origin::Cli { pid } => vec![("PID", pid)],
            Origin::Other { .. } => Vec::new(),
        }
    }
}

/// One recorded activity, immutable once handed to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub origin: Origin,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    pub content: String,
}

impl Event {
    /// Create an event stamped with the current time
    pub fn new(origin: Origin, content: impl Into<String>) -> Self {
        Self {
            origin,
            timestamp_ms: now_ms(),
            content: content.into(),
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn claude_code(
        workspace: impl Into<String>,
        session_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(
            Origin::ClaudeCode {
                workspace: workspace.into(),
                session_id: session_id.into(),
            },
            content,
        )
    }

    pub fn chrome(tab_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(
            Origin::Chrome {
                tab_id: tab_id.into(),
            },
            content,
        )
    }

    pub fn cli(pid: u32, content: impl Into<String>) -> Self {
        Self::new(
            Origin::Cli {
                pid: pid.to_string(),
            },
            content,
        )
    }

    pub fn source(&self) -> &str {
        self.origin.source()
    }

    /// Producers drop events whose content is blank
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// JSON shape sent as `ADD_LOG` data:
/// `{source, timestamp, content, workspace?, sessionId?, tabId?, pid?}`
impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("source", self.source())?;
        map.serialize_entry("timestamp", &self.timestamp_ms)?;
        map.serialize_entry("content", &self.content)?;
        match &self.origin {
            Origin::ClaudeCode {
                workspace,
                session_id,
            } => {
                map.serialize_entry("workspace", workspace)?;
                map.serialize_entry("sessionId", session_id)?;
            }
            Origin::Chrome { tab_id } => map.serialize_entry("tabId", tab_id)?,
            Origin::Cli { pid } => map.serialize_entry("pid", pid)?,
            Origin::Other { attributes, .. } => {
                for (key, value) in attributes {
                    map.serialize_entry(key, value)?;
                }
            }
        }
        map.end()
    }
}

/// A record read back from the log file or returned by the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub origin: Origin,
    /// Local time as rendered in the TIMESTAMP header
    pub timestamp: String,
    pub content: String,
}

impl LogRecord {
    /// Rebuild a record from decoded header fields (keys already lowercased)
    pub fn from_fields(mut fields: BTreeMap<String, String>, content: String) -> Self {
        let source = fields.remove("source").unwrap_or_default();
        let timestamp = fields.remove("timestamp").unwrap_or_default();
        Self {
            origin: Origin::from_fields(&source, fields),
            timestamp,
            content,
        }
    }

    /// Rebuild a record from a daemon-returned JSON object.
    ///
    /// Keys match case-insensitively (`sessionId` and `sessionid` both work).
    /// A numeric timestamp is epoch milliseconds; a string one is kept verbatim.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut fields = BTreeMap::new();
        let mut timestamp = None;
        let mut content = String::new();

        for (key, value) in object {
            let key = key.to_lowercase();
            match key.as_str() {
                "timestamp" => {
                    timestamp = match value {
                        Value::Number(n) => n.as_i64().map(format_timestamp_ms),
                        Value::String(s) => Some(s.clone()),
                        _ => None,
                    };
                }
                "content" => {
                    if let Some(s) = value.as_str() {
                        content = s.to_string();
                    }
                }
                _ => {
                    let text = match value {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        _ => continue,
                    };
                    fields.insert(key, text);
                }
            }
        }

        let source = fields.remove("source").unwrap_or_default();
        Some(Self {
            origin: Origin::from_fields(&source, fields),
            timestamp: timestamp.unwrap_or_else(|| format_timestamp_ms(now_ms())),
            content,
        })
    }

    pub fn source(&self) -> &str {
        self.origin.source()
    }
}

impl From<&Event> for LogRecord {
    fn from(event: &Event) -> Self {
        Self {
            origin: event.origin.clone(),
            timestamp: format_timestamp_ms(event.timestamp_ms),
            content: event.content.trim().to_string(),
        }
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render epoch milliseconds as local `YYYY-MM-DD HH:MM:SS`; out-of-range values render as now
pub fn format_timestamp_ms(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .unwrap_or_else(Local::now)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}
