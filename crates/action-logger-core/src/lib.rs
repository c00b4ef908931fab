pub mod config;
pub mod error;
pub mod event;
pub mod storage;
pub mod ipc;
pub mod pipeline;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use event::{Event, LogRecord, Origin};
pub use ipc::{DaemonClient, DaemonResponse, Endpoint};
pub use pipeline::{Delivery, EventRecorder, LogQuery};
pub use storage::LocalStore;
