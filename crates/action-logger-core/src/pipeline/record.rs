use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::AppConfig;
use crate::event::Event;
use crate::ipc::DaemonClient;
use crate::storage::{today, LocalStore};
use crate::Result;

/// Where an event ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the daemon; nothing was written locally
    Daemon,
    /// Appended to the day's local log file
    LocalFile(PathBuf),
}

/// Delivers events to the daemon, falling back to the local day file
#[derive(Debug, Clone)]
pub struct EventRecorder {
    client: DaemonClient,
    store: LocalStore,
}

impl EventRecorder {
    pub fn new(client: DaemonClient, store: LocalStore) -> Self {
        Self { client, store }
    }

    /// Uses the short record timeout; delivery is best-effort
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            DaemonClient::new(config.endpoint(), config.record_timeout()),
            LocalStore::new(config.log_dir()),
        )
    }

    /// Record one event.
    ///
    /// Daemon failures never surface; a failed local write is returned since
    /// there is nothing left to fall back to.
    pub async fn record(&self, event: &Event) -> Result<Delivery> {
        let response = self.client.add_log(event).await;
        if response.ok {
            info!(source = event.source(), "Event delivered to daemon");
            return Ok(Delivery::Daemon);
        }

        debug!(
            reason = response.error_text(),
            "Daemon unavailable, falling back to local log"
        );
        let path = self.store.append(today(), event).await?;
        info!(path = %path.display(), "Event written to local log");
        Ok(Delivery::LocalFile(path))
    }
}
