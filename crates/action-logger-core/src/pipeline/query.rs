use serde_json::Value;
use tracing::{debug, error};

use crate::config::AppConfig;
use crate::event::{self, LogRecord};
use crate::ipc::DaemonClient;
use crate::storage::{today, LocalStore};
use crate::Result;

/// Number of records returned when the caller does not ask for a specific count
pub const DEFAULT_LIMIT: i64 = 5;

/// Reads recent history from the daemon, falling back to today's local file
#[derive(Debug, Clone)]
pub struct LogQuery {
    client: DaemonClient,
    store: LocalStore,
}

impl LogQuery {
    pub fn new(client: DaemonClient, store: LocalStore) -> Self {
        Self { client, store }
    }

    /// Uses the longer, interactive query timeout
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            DaemonClient::new(config.endpoint(), config.query_timeout()),
            LocalStore::new(config.log_dir()),
        )
    }

    /// Displayable history text; errors are rendered into the text, never returned.
    ///
    /// `limit < 0` returns every record.
    pub async fn query(&self, limit: i64) -> String {
        match self.fetch(limit).await {
            Ok(records) => {
                debug!(count = records.len(), "Fetched log records");
                format_records(&records)
            }
            Err(e) => {
                error!(error = %e, "Failed to get logs");
                format!("Failed to get logs: {}", e)
            }
        }
    }

    /// Records newest-first, from the daemon when it answers, otherwise from the local file
    pub async fn fetch(&self, limit: i64) -> Result<Vec<LogRecord>> {
        let response = self.client.get_logs(limit).await;
        if response.ok {
            return Ok(records_from_message(response.message.as_ref()));
        }

        debug!(
            reason = response.error_text(),
            "Daemon query failed, reading local log"
        );
        self.store.ensure_dir().await?;
        let records = self.store.records(today()).await;
        Ok(select_recent(records, limit))
    }
}

/// Records from a `GET_LOGS` message body (`{count, logs: [...]}`); non-object entries are skipped
fn records_from_message(message: Option<&Value>) -> Vec<LogRecord> {
    message
        .and_then(|m| m.get("logs"))
        .and_then(Value::as_array)
        .map(|logs| logs.iter().filter_map(LogRecord::from_json).collect())
        .unwrap_or_default()
}

/// Keep the last `limit` records (all if negative) and flip to newest-first
pub fn select_recent(mut records: Vec<LogRecord>, limit: i64) -> Vec<LogRecord> {
    if limit >= 0 {
        let keep = usize::try_from(limit).unwrap_or(usize::MAX);
        if records.len() > keep {
            records.drain(..records.len() - keep);
        }
    }
    records.reverse();
    records
}

pub fn format_records(records: &[LogRecord]) -> String {
    let blocks: Vec<String> = records.iter().map(event::encode_record).collect();
    format!(
        "Last {} log records:\n\n{}",
        records.len(),
        blocks.join("\n\n")
    )
}
