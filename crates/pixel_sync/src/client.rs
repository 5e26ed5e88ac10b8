//! WebSocket shard client.
//!
//! Every shard connection runs in its own Tokio task that only moves frames:
//! outgoing text arrives over an unbounded channel from [`WsShardTransport`],
//! incoming frames and connection state changes go to one shared event channel
//! tagged with the shard index. All session state lives in
//! [`run_session`], which handles one event at a time.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt, future::join_all};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::config::SyncConfig;
use crate::connection::ShardTransport;
use crate::controller::{ClickOutcome, SyncController};
use crate::cooldown::{CountdownDisplay, TICK_INTERVAL};
use crate::protocol::SessionToken;
use crate::render::RenderSurface;
use crate::snapshot::Coordinate;
use crate::{Result, SyncError};

/// Connection events reported by a shard task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardEvent {
    /// The socket is open.
    Ready,
    /// A text frame arrived.
    Text(String),
    /// The server closed the connection.
    Closed,
    /// The socket could not be opened; the task has ended.
    Failed(String),
    /// Reading or sending failed on the open socket; the task has ended.
    Lost(String),
}

/// How long a finished session waits for shard tasks to flush and close.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Sending half of a shard task.
#[derive(Debug, Clone)]
pub struct WsShardTransport {
    outgoing: mpsc::UnboundedSender<String>,
}

impl ShardTransport for WsShardTransport {
    fn send_text(&mut self, text: String) -> std::result::Result<(), String> {
        self.outgoing.send(text).map_err(|_| "connection closed".to_string())
    }
}

/// Open the WebSocket of `shard` in a background task.
///
/// Frames sent before the socket is open are queued and go out once it is.
/// The task flushes its queue and closes the socket once every transport
/// handle is dropped.
pub fn spawn_shard(shard: usize, url: String, events: mpsc::UnboundedSender<(usize, ShardEvent)>) -> (WsShardTransport, JoinHandle<()>) {
    let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_shard(shard, url, outgoing_rx, events));
    (WsShardTransport { outgoing }, handle)
}

async fn run_shard(shard: usize, url: String, mut outgoing: mpsc::UnboundedReceiver<String>, events: mpsc::UnboundedSender<(usize, ShardEvent)>) {
    log::info!("Connecting shard {shard}: {url}");

    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            let _ = events.send((shard, ShardEvent::Failed(e.to_string())));
            return;
        }
    };
    let (mut write, mut read) = ws_stream.split();

    if events.send((shard, ShardEvent::Ready)).is_err() {
        return;
    }

    loop {
        tokio::select! {
            biased;

            text = outgoing.recv() => {
                match text {
                    Some(text) => {
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            log::error!("shard {shard}: failed to send message: {e}");
                            let _ = events.send((shard, ShardEvent::Lost(e.to_string())));
                            break;
                        }
                    }
                    None => {
                        let _ = write.close().await;
                        // wait for the server to answer the close frame
                        while let Some(Ok(msg)) = read.next().await {
                            if matches!(msg, Message::Close(_)) {
                                break;
                            }
                        }
                        break;
                    }
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if events.send((shard, ShardEvent::Text(text.as_str().to_owned()))).is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        let event = match String::from_utf8(bytes.to_vec()) {
                            Ok(text) => ShardEvent::Text(text),
                            Err(_) => {
                                log::warn!("shard {shard}: dropping non UTF-8 binary frame");
                                continue;
                            }
                        };
                        if events.send((shard, event)).is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = events.send((shard, ShardEvent::Closed));
                        break;
                    }
                    Some(Err(e)) => {
                        let _ = events.send((shard, ShardEvent::Lost(e.to_string())));
                        break;
                    }
                    _ => {}
                }
            }
        }
    }
    log::info!("shard {shard}: connection task finished");
}

/// Commands from the application to a running session.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Paint a canvas cell.
    Paint { coordinate: Coordinate, color: String },
    /// Click at a position in surface pixels.
    PointerClick { px: f64, py: f64, color: String },
    /// Ask the surface to present itself.
    Flush,
    /// End the session.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    Continue,
    Disconnect,
}

/// Receives what the session loop cannot handle itself.
pub trait SessionObserver {
    /// Decide what to do about an error. `shard` is set for errors tied to a connection.
    fn on_error(&mut self, shard: Option<usize>, error: &SyncError) -> ErrorAction {
        match shard {
            Some(shard) => log::warn!("shard {shard}: {error}"),
            None => log::warn!("{error}"),
        }
        ErrorAction::Continue
    }

    fn on_click(&mut self, _outcome: ClickOutcome) {}
}

/// Observer that logs every error and never disconnects.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SessionObserver for LogObserver {}

/// Connect every configured shard and run the session until shutdown.
///
/// The session ends on [`SessionCommand::Shutdown`], when every shard
/// connection has ended or when the observer asks to disconnect. A closed
/// command channel ends it once no write is held for a shard that is not ready
/// yet. Before returning, the shard tasks get [`SHUTDOWN_GRACE`] to send what
/// they have queued. The surface is handed back on return.
pub async fn run_session<S, D, O>(
    config: SyncConfig,
    token: SessionToken,
    surface: S,
    display: D,
    observer: &mut O,
    mut commands: mpsc::Receiver<SessionCommand>,
) -> Result<S>
where
    S: RenderSurface,
    D: CountdownDisplay,
    O: SessionObserver,
{
    config.validate()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (transports, handles): (Vec<WsShardTransport>, Vec<JoinHandle<()>>) = config
        .shard_addresses()
        .into_iter()
        .enumerate()
        .map(|(shard, url)| spawn_shard(shard, url, event_tx.clone()))
        .unzip();
    drop(event_tx);

    let mut controller = SyncController::new(config, token, transports, surface, display)?;

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut commands_open = true;

    loop {
        if !commands_open && controller.connections().pending_writes() == 0 {
            log::info!("command channel closed, ending session");
            break;
        }

        tokio::select! {
            event = event_rx.recv() => {
                let Some((shard, event)) = event else {
                    log::info!("all shard connections ended");
                    break;
                };
                let result = match event {
                    ShardEvent::Ready => controller.on_connection_ready(shard),
                    ShardEvent::Text(text) => controller.on_server_text(shard, &text).map(|_| ()),
                    ShardEvent::Closed => {
                        log::info!("shard {shard}: closed by server");
                        controller.on_connection_closed(shard);
                        Ok(())
                    }
                    ShardEvent::Failed(reason) => {
                        controller.on_connection_closed(shard);
                        Err(SyncError::Connect { shard, reason })
                    }
                    ShardEvent::Lost(reason) => {
                        controller.on_connection_closed(shard);
                        Err(SyncError::Disconnected { shard, reason })
                    }
                };
                if let Err(err) = result {
                    if observer.on_error(Some(shard), &err) == ErrorAction::Disconnect {
                        break;
                    }
                }
            }

            cmd = commands.recv(), if commands_open => {
                let result = match cmd {
                    Some(SessionCommand::Paint { coordinate, color }) => controller.on_user_click(coordinate, &color),
                    Some(SessionCommand::PointerClick { px, py, color }) => controller.on_pointer_click(px, py, &color),
                    Some(SessionCommand::Flush) => {
                        controller.surface_mut().flush();
                        continue;
                    }
                    Some(SessionCommand::Shutdown) => break,
                    None => {
                        commands_open = false;
                        continue;
                    }
                };
                match result {
                    Ok(outcome) => observer.on_click(outcome),
                    Err(err) => {
                        let shard = match &err {
                            SyncError::Delivery { shard, .. } => Some(*shard),
                            _ => None,
                        };
                        if observer.on_error(shard, &err) == ErrorAction::Disconnect {
                            break;
                        }
                    }
                }
            }

            _ = ticker.tick() => {
                controller.tick();
            }
        }
    }

    // dropping the controller closes every outgoing channel
    let surface = controller.into_surface();
    if tokio::time::timeout(SHUTDOWN_GRACE, join_all(handles)).await.is_err() {
        log::warn!("shard connections did not close within {}s", SHUTDOWN_GRACE.as_secs());
    }
    Ok(surface)
}
