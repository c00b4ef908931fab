//! Local fallback store: one human-readable file per day
//!
//! Appends are a read-modify-write of the whole day file and take no lock.
//! Two processes falling back at the same instant can lose one update; this
//! is an accepted limitation, not something the store tries to prevent.

use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::event::{codec, Event, LogRecord};
use crate::{Error, Result};

/// Day key used for file names (`YYYY-MM-DD`)
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    base_dir: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at an already-resolved directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `<base-dir>/<YYYY-MM-DD>.log`
    pub fn path(&self, day: NaiveDate) -> PathBuf {
        self.base_dir.join(format!("{}.log", day.format(DAY_FORMAT)))
    }

    /// Create the base directory (and parents) if it does not exist
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|source| Error::LogDir {
                path: self.base_dir.clone(),
                source,
            })
    }

    /// Append one encoded event to the day's file, returning the file path.
    ///
    /// Unreadable existing content is treated as empty; write failures are returned.
    pub async fn append(&self, day: NaiveDate, event: &Event) -> Result<PathBuf> {
        self.ensure_dir().await?;

        let path = self.path(day);
        let history = self.read_all(day).await;
        let record = codec::encode(event);

        let content = if history.is_empty() {
            record
        } else {
            format!("{}{}{}", history, codec::RECORD_JOINER, record)
        };

        tokio::fs::write(&path, content)
            .await
            .map_err(|source| Error::Storage {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), source = event.source(), "Appended event to local log");
        Ok(path)
    }

    /// Read the day's file, trimmed; missing or unreadable files yield an empty string
    pub async fn read_all(&self, day: NaiveDate) -> String {
        let path = self.path(day);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => content.trim().to_string(),
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read local log, treating as empty");
                String::new()
            }
        }
    }

    /// Read and decode the day's records, oldest first
    pub async fn records(&self, day: NaiveDate) -> Vec<LogRecord> {
        codec::decode(&self.read_all(day).await)
    }
}
