use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use tokio::io::AsyncReadExt;
use tracing::debug;

use action_logger_core::event::{now_ms, SOURCE_CLAUDE_CODE, SOURCE_CLI};
use action_logger_core::{AppConfig, Delivery, Event, EventRecorder, Origin};

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Event source ("CLI", "Chrome", "Claude Code" or any other label)
    #[arg(short, long, default_value = SOURCE_CLI)]
    pub source: String,
    /// Process id for CLI events (defaults to the calling process)
    #[arg(long)]
    pub pid: Option<u32>,
    /// Browser tab id for Chrome events
    #[arg(long)]
    pub tab_id: Option<String>,
    /// Workspace directory for Claude Code events
    #[arg(long)]
    pub workspace: Option<String>,
    /// Session id for Claude Code events
    #[arg(long)]
    pub session_id: Option<String>,
    /// Event time in milliseconds since the epoch (defaults to now)
    #[arg(long)]
    pub timestamp: Option<i64>,
    /// Event content; read from stdin when omitted
    pub content: Vec<String>,
}

pub async fn run(config: &AppConfig, args: RecordArgs) -> Result<()> {
    let content = if args.content.is_empty() {
        let mut raw = String::new();
        tokio::io::stdin().read_to_string(&mut raw).await?;
        raw
    } else {
        args.content.join(" ")
    };

    let event = build_event(&args, content);
    if !event.has_content() {
        debug!("Empty content, nothing recorded");
        return Ok(());
    }

    match EventRecorder::from_config(config).record(&event).await? {
        Delivery::Daemon => debug!("Recorded via daemon"),
        Delivery::LocalFile(path) => debug!(path = %path.display(), "Recorded to local log"),
    }
    Ok(())
}

fn build_event(args: &RecordArgs, content: String) -> Event {
    let mut fields = BTreeMap::new();
    let pid = args.pid.unwrap_or_else(caller_pid);
    fields.insert("pid".to_string(), pid.to_string());
    if let Some(tab_id) = &args.tab_id {
        fields.insert("tabid".to_string(), tab_id.clone());
    }
    if let Some(workspace) = &args.workspace {
        fields.insert("workspace".to_string(), workspace.clone());
    }
    if let Some(session_id) = &args.session_id {
        fields.insert("sessionid".to_string(), session_id.clone());
    }

    let origin = match Origin::from_fields(source_label(&args.source), fields) {
        // pid was only a default for CLI events; keep explicit flags for other sources
        Origin::Other { source, mut attributes } => {
            if args.pid.is_none() {
                attributes.remove("pid");
            }
            Origin::Other { source, attributes }
        }
        origin => origin,
    };

    Event::new(origin, content).with_timestamp(args.timestamp.unwrap_or_else(now_ms))
}

/// Accept the unspaced spelling on the command line
fn source_label(source: &str) -> &str {
    if source.eq_ignore_ascii_case("claudecode") {
        SOURCE_CLAUDE_CODE
    } else {
        source
    }
}

#[cfg(unix)]
fn caller_pid() -> u32 {
    std::os::unix::process::parent_id()
}

#[cfg(not(unix))]
fn caller_pid() -> u32 {
    std::process::id()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(source: &str) -> RecordArgs {
        RecordArgs {
            source: source.to_string(),
            pid: None,
            tab_id: None,
            workspace: None,
            session_id: None,
            timestamp: None,
            content: Vec::new(),
        }
    }

    #[test]
    fn test_cli_event_uses_explicit_pid() {
        let mut a = args("CLI");
        a.pid = Some(1234);
        a.timestamp = Some(1_700_000_000_000);
        let event = build_event(&a, "ls -la".to_string());
        assert_eq!(
            event.origin,
            Origin::Cli {
                pid: "1234".to_string()
            }
        );
        assert_eq!(event.timestamp_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_chrome_event() {
        let mut a = args("Chrome");
        a.tab_id = Some("17".to_string());
        let event = build_event(&a, "Rust docs".to_string());
        assert_eq!(
            event.origin,
            Origin::Chrome {
                tab_id: "17".to_string()
            }
        );
    }

    #[test]
    fn test_other_source_drops_default_pid() {
        let event = build_event(&args("Slack"), "standup".to_string());
        assert_eq!(
            event.origin,
            Origin::Other {
                source: "Slack".to_string(),
                attributes: BTreeMap::new(),
            }
        );
    }

    #[test]
    fn test_unspaced_claude_code_source() {
        let mut a = args("ClaudeCode");
        a.workspace = Some("/repo".to_string());
        a.session_id = Some("s9".to_string());
        let event = build_event(&a, "fix the build".to_string());
        assert_eq!(
            event.origin,
            Origin::ClaudeCode {
                workspace: "/repo".to_string(),
                session_id: "s9".to_string(),
            }
        );
    }
}
