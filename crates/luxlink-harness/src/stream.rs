//! Mock WebSocket stream server.

use std::{io, net::SocketAddr, time::Duration};

use futures::SinkExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// A WebSocket listener that plays a scripted message sequence to each
/// connection.
///
/// Connection `n` plays `scripts[n]` (the last script repeats for later
/// connections). With `close_after` set the server closes the socket once
/// the script is done — the trigger for the client's reconnect path;
/// otherwise the connection idles open.
pub struct MockStream {
    addr: SocketAddr,
    task: tokio::task::JoinHandle<()>,
}

impl MockStream {
    /// Bind on an ephemeral loopback port.
    pub async fn start(scripts: Vec<Vec<Value>>, close_after: bool) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let task = tokio::spawn(async move {
            let mut connection = 0usize;
            loop {
                let Ok((stream, _peer)) = listener.accept().await else {
                    return;
                };
                let script = scripts
                    .get(connection.min(scripts.len().saturating_sub(1)))
                    .cloned()
                    .unwrap_or_default();
                connection += 1;

                tokio::spawn(async move {
                    let Ok(mut socket) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    for message in script {
                        if socket.send(Message::text(message.to_string())).await.is_err() {
                            return;
                        }
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                    if close_after {
                        let _ = socket.close(None).await;
                    } else {
                        // Idle until the client goes away.
                        std::future::pending::<()>().await;
                    }
                });
            }
        });

        Ok(Self { addr, task })
    }

    /// WebSocket URL for `path` (e.g. `/logs/stream`).
    pub fn url(&self, path: &str) -> String {
        format!("ws://{}{path}", self.addr)
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}
