//! IPC with the long-running logging daemon
//!
//! The daemon listens on a Unix domain socket (named pipe on Windows). This
//! side only ever acts as a client: one connection per call, no pooling.

mod client;
mod protocol;
#[cfg(all(test, unix))]
pub(crate) mod testing;

pub use client::DaemonClient;
pub use protocol::*;
