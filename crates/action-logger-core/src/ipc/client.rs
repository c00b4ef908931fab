//! IPC client for the logging daemon
//!
//! A call opens one connection, writes one command and waits for the first
//! complete JSON response. Connect errors, malformed replies and timeouts all
//! resolve to `DaemonResponse { ok: false, .. }` so orchestration code can
//! await a call unconditionally. The stream is owned by the call and dropped
//! on every exit path, including when the timeout fires.

use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::protocol::*;
use crate::event::Event;
use crate::{Error, Result};

const READ_CHUNK: usize = 4096;

/// Client for communicating with the daemon
#[derive(Debug, Clone)]
pub struct DaemonClient {
    endpoint: Endpoint,
    timeout: Duration,
}

impl DaemonClient {
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    /// Deliver one event
    pub async fn add_log(&self, event: &Event) -> DaemonResponse {
        self.call(Action::AddLog, event).await
    }

    /// Ask the daemon for its most recent records
    pub async fn get_logs(&self, limit: i64) -> DaemonResponse {
        self.call(Action::GetLogs, &GetLogsParams { limit }).await
    }

    /// Send a command and wait for the first response, the connection failing, or the timeout
    pub async fn call<T: Serialize>(&self, action: Action, data: &T) -> DaemonResponse {
        let line = match encode_command(action, data) {
            Ok(line) => line,
            Err(e) => {
                warn!(?action, error = %e, "Failed to encode daemon command");
                return DaemonResponse::failure(e.to_string());
            }
        };

        match timeout(self.timeout, self.exchange(&line)).await {
            Ok(Ok(response)) => {
                debug!(?action, ok = response.ok, "Daemon responded");
                response
            }
            Ok(Err(e)) => {
                debug!(?action, endpoint = %self.endpoint, error = %e, "Daemon call failed");
                DaemonResponse::failure(e.to_string())
            }
            Err(_) => {
                warn!(?action, endpoint = %self.endpoint, "Daemon response timed out");
                DaemonResponse::failure(format!(
                    "Daemon response timed out after {} ms",
                    self.timeout.as_millis()
                ))
            }
        }
    }

    #[cfg(unix)]
    async fn exchange(&self, line: &str) -> Result<DaemonResponse> {
        let stream = tokio::net::UnixStream::connect(self.endpoint.as_path())
            .await
            .map_err(|e| self.connect_error(e))?;
        exchange_on(stream, line).await
    }

    #[cfg(windows)]
    async fn exchange(&self, line: &str) -> Result<DaemonResponse> {
        use tokio::net::windows::named_pipe::ClientOptions;

        let pipe = ClientOptions::new()
            .open(self.endpoint.as_path())
            .map_err(|e| self.connect_error(e))?;
        exchange_on(pipe, line).await
    }

    fn connect_error(&self, e: std::io::Error) -> Error {
        Error::Daemon(format!("Failed to connect to daemon at {}: {}", self.endpoint, e))
    }
}

fn encode_command<T: Serialize>(action: Action, data: &T) -> Result<String> {
    Ok(serde_json::to_string(&Command { action, data })?)
}

async fn exchange_on<S>(mut stream: S, line: &str) -> Result<DaemonResponse>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.flush().await?;

    read_response(&mut stream).await
}

/// Read until the first complete JSON value has arrived.
///
/// The reply may span several lines and may be followed by further bytes;
/// only the first value counts.
async fn read_response<R>(reader: &mut R) -> Result<DaemonResponse>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            if buf.is_empty() {
                return Err(Error::Daemon("Connection closed without response".to_string()));
            }
            return Ok(parse_response(&buf));
        }
        buf.extend_from_slice(&chunk[..n]);

        let mut values = serde_json::Deserializer::from_slice(&buf).into_iter::<DaemonResponse>();
        match values.next() {
            Some(Ok(response)) => return Ok(response),
            // Partial value, or nothing but whitespace so far
            Some(Err(e)) if e.is_eof() => continue,
            None => continue,
            Some(Err(e)) => {
                warn!(error = %e, "Failed to parse daemon response");
                return Ok(DaemonResponse::failure(e.to_string()));
            }
        }
    }
}

fn parse_response(bytes: &[u8]) -> DaemonResponse {
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to parse daemon response");
        DaemonResponse::failure(e.to_string())
    })
}
