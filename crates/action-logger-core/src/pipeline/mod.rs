//! Delivery and retrieval orchestration: daemon first, local file as fallback

mod query;
mod record;

pub use query::{format_records, select_recent, LogQuery, DEFAULT_LIMIT};
pub use record::{Delivery, EventRecorder};
