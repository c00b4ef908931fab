//! In-process fake daemon for tests

use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::oneshot;

use super::protocol::Endpoint;

/// How the fake daemon answers the single connection it accepts
pub(crate) enum Reply {
    /// Newline-terminated response, then close
    Line(&'static str),
    /// Response without a trailing newline, connection kept open
    Raw(&'static str),
    /// Read the request and never answer
    Silent,
    /// Read the request and hang up
    Close,
}

pub(crate) struct FakeDaemon {
    pub endpoint: Endpoint,
    request_rx: oneshot::Receiver<String>,
    _dir: TempDir,
}

impl FakeDaemon {
    /// The request line the daemon received, empty if it never got one
    pub async fn received(self) -> String {
        self.request_rx.await.unwrap_or_default()
    }
}

pub(crate) fn spawn_fake_daemon(reply: Reply) -> FakeDaemon {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daemon.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let (request_tx, request_rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        let _ = reader.read_line(&mut line).await;
        let _ = request_tx.send(line.trim_end().to_string());

        match reply {
            Reply::Line(text) => {
                let _ = writer.write_all(format!("{}\n", text).as_bytes()).await;
                let _ = writer.flush().await;
            }
            Reply::Raw(text) => {
                let _ = writer.write_all(text.as_bytes()).await;
                let _ = writer.flush().await;
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Reply::Silent => tokio::time::sleep(Duration::from_secs(5)).await,
            Reply::Close => {}
        }
    });

    FakeDaemon {
        endpoint: Endpoint::new(path),
        request_rx,
        _dir: dir,
    }
}
