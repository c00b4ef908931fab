use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::debug;

use action_logger_core::{AppConfig, Event, EventRecorder};

/// Payload Claude Code pipes to a `UserPromptSubmit` hook (fields we use)
#[derive(Debug, Deserialize)]
struct HookInput {
    #[serde(default)]
    cwd: String,
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    prompt: String,
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let mut raw = String::new();
    tokio::io::stdin().read_to_string(&mut raw).await?;

    let Some(event) = event_from_payload(&raw) else {
        debug!("No prompt to record");
        return Ok(());
    };

    EventRecorder::from_config(config)
        .record(&event)
        .await
        .context("Failed to record user prompt")?;
    Ok(())
}

/// Unparseable payloads and blank prompts produce no event
fn event_from_payload(raw: &str) -> Option<Event> {
    let input: HookInput = serde_json::from_str(raw).ok()?;
    let event = Event::claude_code(input.cwd, input.session_id, input.prompt);
    event.has_content().then_some(event)
}
