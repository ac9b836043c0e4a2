//! Controller tasks.
//!
//! Every network or timer concern runs as a tokio task that owns its I/O and
//! reports back to the event loop over one mpsc channel. The loop owns all
//! UI state; tasks never touch it directly. Stopping a task sends a command
//! and awaits settlement, so no orphaned socket or timer survives a mode
//! exit.

use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use luxlink_app::{Backoff, ConnectionState, FetchData, FetchQuery, WatchTarget};
use luxlink_client::{BridgeClient, Device, LogQuery, ws};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::handlers;

/// Which reconnecting stream an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamId {
    /// `/logs/stream`.
    LogTail,
    /// `/events/stream`.
    Events,
}

/// Messages from controller tasks to the event loop.
#[derive(Debug)]
pub enum ControllerEvent {
    /// A reconnecting stream changed connection state.
    StreamState {
        /// Stream that changed.
        id: StreamId,
        /// New state.
        state: ConnectionState,
    },
    /// A reconnecting stream decoded a payload.
    StreamMessage {
        /// Stream that received it.
        id: StreamId,
        /// Decoded JSON object.
        payload: serde_json::Value,
    },
    /// The watch task produced a fresh overlay rendering.
    WatchRendered {
        /// Full overlay content, header included.
        text: String,
    },
    /// A log-view fetch finished.
    ViewFetched {
        /// Generation the fetch was started with.
        generation: u64,
        /// Page data or error message.
        outcome: Result<FetchData, String>,
    },
    /// A toolbar status refresh finished.
    StatusFetched {
        /// Health string, when the probe succeeded.
        health: Option<String>,
        /// Device list, when the probe succeeded.
        devices: Option<Vec<Device>>,
    },
}

/// Commands into a reconnecting stream task.
#[derive(Debug)]
enum StreamCommand {
    /// Push a filter update over the live socket (or remember it for the
    /// next handshake).
    SetFilters(serde_json::Value),
    /// Shut the stream down.
    Stop,
}

/// Handle to a running stream task.
pub struct StreamHandle {
    commands: mpsc::Sender<StreamCommand>,
    task: tokio::task::JoinHandle<()>,
}

impl StreamHandle {
    /// Push a filter update; applied immediately when connected, otherwise
    /// on the next reconnect handshake.
    pub async fn set_filters(&self, filters: serde_json::Value) {
        let _ = self.commands.send(StreamCommand::SetFilters(filters)).await;
    }

    /// Stop the stream and wait for the task to settle. Safe in any state;
    /// afterwards the stream is Disconnected with no pending retry.
    pub async fn stop(self) {
        let _ = self.commands.send(StreamCommand::Stop).await;
        let _ = self.task.await;
    }
}

/// Configuration for one reconnecting stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket URL to connect to.
    pub url: String,
    /// Optional API key for the handshake headers.
    pub api_key: Option<String>,
    /// Payload pushed right after connecting (filter handshake).
    pub initial_payload: Option<serde_json::Value>,
}

/// Spawn a reconnecting WebSocket stream task.
///
/// The task loops: connect, report `Connected`, forward decoded JSON
/// payloads (pings swallowed, malformed frames skipped), and on any failure
/// report `Reconnecting`, sleep out the exponential backoff, and retry.
/// Network errors never escape the task.
pub fn spawn_stream(
    id: StreamId,
    config: StreamConfig,
    events: mpsc::Sender<ControllerEvent>,
) -> StreamHandle {
    let (commands, rx) = mpsc::channel(8);
    let task = tokio::spawn(stream_loop(id, config, events, rx));
    StreamHandle { commands, task }
}

async fn stream_loop(
    id: StreamId,
    mut config: StreamConfig,
    events: mpsc::Sender<ControllerEvent>,
    mut commands: mpsc::Receiver<StreamCommand>,
) {
    let mut backoff = Backoff::new();

    'reconnect: loop {
        let _ = events.send(ControllerEvent::StreamState { id, state: ConnectionState::Connecting }).await;

        // Connect, staying responsive to commands; a Stop here cancels the
        // in-flight attempt by dropping its future.
        let url = config.url.clone();
        let api_key = config.api_key.clone();
        let connect = ws::connect(&url, api_key.as_deref());
        tokio::pin!(connect);
        let connected = loop {
            tokio::select! {
                result = &mut connect => break result,
                command = commands.recv() => match command {
                    Some(StreamCommand::SetFilters(filters)) => {
                        config.initial_payload = Some(filters);
                    },
                    Some(StreamCommand::Stop) | None => break 'reconnect,
                },
            }
        };

        let mut socket = match connected {
            Ok(socket) => socket,
            Err(error) => {
                tracing::debug!(stream = ?id, %error, "stream connect failed");
                if !wait_backoff(&mut backoff, &events, id, &mut commands, &mut config).await {
                    break 'reconnect;
                }
                continue 'reconnect;
            },
        };

        backoff.reset();
        let _ = events.send(ControllerEvent::StreamState { id, state: ConnectionState::Connected }).await;

        if let Some(payload) = &config.initial_payload
            && let Err(error) = socket.send(Message::text(payload.to_string())).await
        {
            tracing::debug!(stream = ?id, %error, "initial filter send failed");
        }

        // Receive loop. Ends on socket failure/closure (reconnect) or Stop.
        loop {
            tokio::select! {
                message = socket.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<serde_json::Value>(text.as_str()) {
                            Ok(payload) => {
                                // Keepalive pings never reach the UI.
                                if payload.get("type").and_then(|t| t.as_str()) == Some("ping") {
                                    continue;
                                }
                                let _ = events.send(ControllerEvent::StreamMessage { id, payload }).await;
                            },
                            Err(error) => {
                                tracing::debug!(stream = ?id, %error, "skipping malformed payload");
                            },
                        }
                    },
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                        if !wait_backoff(&mut backoff, &events, id, &mut commands, &mut config).await {
                            break 'reconnect;
                        }
                        continue 'reconnect;
                    },
                    Some(Ok(_)) => {}, // binary/ping/pong frames: ignored
                },
                command = commands.recv() => match command {
                    Some(StreamCommand::SetFilters(filters)) => {
                        config.initial_payload = Some(filters.clone());
                        if let Err(error) = socket.send(Message::text(filters.to_string())).await {
                            // The reconnect handshake will resend them.
                            tracing::debug!(stream = ?id, %error, "filter update send failed");
                        }
                    },
                    Some(StreamCommand::Stop) | None => {
                        let _ = socket.close(None).await;
                        break 'reconnect;
                    },
                },
            }
        }
    }

    let _ = events.send(ControllerEvent::StreamState { id, state: ConnectionState::Disconnected }).await;
}

/// Report `Reconnecting` and sleep out the backoff delay. Returns `false`
/// when a Stop arrived during the wait.
async fn wait_backoff(
    backoff: &mut Backoff,
    events: &mpsc::Sender<ControllerEvent>,
    id: StreamId,
    commands: &mut mpsc::Receiver<StreamCommand>,
    config: &mut StreamConfig,
) -> bool {
    let _ = events.send(ControllerEvent::StreamState { id, state: ConnectionState::Reconnecting }).await;
    let delay = backoff.next_delay();
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            () = &mut sleep => return true,
            command = commands.recv() => match command {
                Some(StreamCommand::SetFilters(filters)) => {
                    // Applied on the next handshake.
                    config.initial_payload = Some(filters);
                },
                Some(StreamCommand::Stop) | None => return false,
            },
        }
    }
}

/// Commands into the watch task.
#[derive(Debug)]
enum WatchCommand {
    /// Change the refresh interval, effective on the next sleep.
    SetInterval(Duration),
    /// Shut the watch loop down.
    Stop,
}

/// Handle to a running watch task.
pub struct WatchHandle {
    commands: mpsc::Sender<WatchCommand>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Change the refresh interval; takes effect on the next sleep.
    pub async fn set_interval(&self, interval: Duration) {
        let _ = self.commands.send(WatchCommand::SetInterval(interval)).await;
    }

    /// Stop the watch loop and wait for it to settle.
    pub async fn stop(self) {
        let _ = self.commands.send(WatchCommand::Stop).await;
        let _ = self.task.await;
    }
}

/// Spawn the watch refresh task: render the target, hand the text to the
/// event loop, sleep, repeat. Renderers return their output as a value, so
/// the main output buffer is never involved.
pub fn spawn_watch(
    client: BridgeClient,
    target: WatchTarget,
    mut interval: Duration,
    width: usize,
    events: mpsc::Sender<ControllerEvent>,
) -> WatchHandle {
    let (commands, mut rx) = mpsc::channel(8);
    let task = tokio::spawn(async move {
        loop {
            let header = luxlink_app::watch::watch_header(target, chrono::Local::now());
            let body = match render_watch_target(&client, target, width).await {
                Ok(rendered) => rendered,
                Err(error) => format!("Error executing watch command: {error}\n"),
            };
            let _ = events.send(ControllerEvent::WatchRendered { text: format!("{header}{body}") }).await;

            let sleep = tokio::time::sleep(interval);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    () = &mut sleep => break,
                    command = rx.recv() => match command {
                        Some(WatchCommand::SetInterval(new_interval)) => interval = new_interval,
                        Some(WatchCommand::Stop) | None => return,
                    },
                }
            }
        }
    });
    WatchHandle { commands, task }
}

async fn render_watch_target(
    client: &BridgeClient,
    target: WatchTarget,
    width: usize,
) -> Result<String, luxlink_client::ClientError> {
    match target {
        WatchTarget::Devices => handlers::monitoring::render_devices(client, width).await,
        WatchTarget::Mappings => handlers::mappings::render_list(client, width).await,
        WatchTarget::Dashboard => handlers::monitoring::render_dashboard(client, width).await,
        WatchTarget::Logs => handlers::monitoring::render_recent_logs(client, width).await,
    }
}

/// Spawn a one-shot log-view fetch. The result carries the generation so
/// stale responses are dropped by the state machine.
pub fn spawn_view_fetch(
    client: BridgeClient,
    generation: u64,
    query: FetchQuery,
    events: mpsc::Sender<ControllerEvent>,
) {
    tokio::spawn(async move {
        let outcome = match query {
            FetchQuery::Page { level, logger, limit, offset } => client
                .logs(&LogQuery { level, logger, limit, offset })
                .await
                .map(|page| FetchData::Page { logs: page.logs, total: page.total })
                .map_err(|e| e.to_string()),
            FetchQuery::Search { pattern, regex, limit } => client
                .search_logs(&pattern, regex, limit)
                .await
                .map(|results| FetchData::Search { logs: results.logs, count: results.count })
                .map_err(|e| e.to_string()),
        };
        let _ = events.send(ControllerEvent::ViewFetched { generation, outcome }).await;
    });
}

/// Spawn a one-shot toolbar status refresh (health + device counts). Errors
/// are reported as `None` fields and otherwise ignored — the toolbar is
/// advisory.
pub fn spawn_status_refresh(client: BridgeClient, events: mpsc::Sender<ControllerEvent>) {
    tokio::spawn(async move {
        let started = Instant::now();
        let health = client.health().await.ok().map(|h| h.status);
        let devices = client.devices().await.ok();
        tracing::trace!(elapsed = ?started.elapsed(), "toolbar status refresh");
        let _ = events.send(ControllerEvent::StatusFetched { health, devices }).await;
    });
}
