//! WebSocket Relay Server
//!
//! Async WebSocket transport. One Tokio task per connection reads frames
//! and forwards decoded events to the relay hub; a companion task drains
//! the connection's outbound channel back onto the socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::relay::hub::RelayHub;
use crate::relay::registry::ConnId;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".parse().unwrap(),
            max_connections: 1000,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, RelayServerError> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("ARENA_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|_| RelayServerError::InvalidConfig(format!("bad bind address: {}", addr)))?;
        }
        if let Ok(max) = std::env::var("ARENA_MAX_CONNECTIONS") {
            config.max_connections = max
                .parse()
                .map_err(|_| RelayServerError::InvalidConfig(format!("bad connection limit: {}", max)))?;
        }

        Ok(config)
    }
}

/// Relay server errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The realtime relay server.
pub struct RelayServer {
    /// Server configuration.
    config: ServerConfig,
    /// Shared matchmaking & relay core.
    hub: Arc<RelayHub>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl RelayServer {
    /// Create a new relay server around an existing hub.
    pub fn new(config: ServerConfig, hub: Arc<RelayHub>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            hub,
            shutdown_tx,
        }
    }

    /// The hub this server feeds.
    pub fn hub(&self) -> &Arc<RelayHub> {
        &self.hub
    }

    /// Run the accept loop until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), RelayServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Relay server v{} listening on {}", self.config.version, self.config.bind_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.hub.connection_count().await >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            debug!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Spawn the per-connection task.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let hub = self.hub.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<ServerMessage>();

            let conn = ConnId::generate();
            hub.connect(conn, msg_tx.clone()).await;

            // Writer task: drain the outbound channel onto the socket.
            let writer_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match ClientMessage::from_json(&text) {
                                    Ok(client_msg) => {
                                        Self::dispatch(&hub, conn, client_msg, &msg_tx).await;
                                    }
                                    Err(e) => {
                                        // Malformed frames are dropped; the
                                        // sender stays connected and gets no
                                        // error frame on this surface.
                                        debug!("Invalid frame from {}: {}", addr, e);
                                    }
                                }
                            }
                            Some(Ok(Message::Binary(data))) => {
                                match ClientMessage::from_bytes(&data) {
                                    Ok(client_msg) => {
                                        Self::dispatch(&hub, conn, client_msg, &msg_tx).await;
                                    }
                                    Err(e) => {
                                        debug!("Invalid binary frame from {}: {}", addr, e);
                                    }
                                }
                            }
                            Some(Ok(Message::Ping(_))) => {
                                let _ = msg_tx.send(ServerMessage::Pong {
                                    timestamp: 0,
                                    server_time: now_millis(),
                                });
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                debug!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        });
                        break;
                    }
                }
            }

            writer_task.abort();
            hub.disconnect(conn).await;
        });
    }

    /// Forward one decoded event to the hub.
    async fn dispatch(
        hub: &Arc<RelayHub>,
        conn: ConnId,
        msg: ClientMessage,
        sender: &mpsc::UnboundedSender<ServerMessage>,
    ) {
        match msg {
            ClientMessage::InitIdentity(init) => {
                hub.init_identity(conn, init).await;
            }
            ClientMessage::RequestMatch => {
                hub.request_match(conn).await;
            }
            ClientMessage::Move(report) => {
                hub.relay_move(conn, report.room_id, report.x, report.y).await;
            }
            ClientMessage::GameOver(report) => {
                hub.game_over(conn, report).await;
            }
            ClientMessage::Ping { timestamp } => {
                let _ = sender.send(ServerMessage::Pong {
                    timestamp,
                    server_time: now_millis(),
                });
            }
        }
    }

    /// Signal the accept loop and all connection tasks to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.hub.connection_count().await
    }

    /// Get active room count.
    pub async fn room_count(&self) -> usize {
        self.hub.room_count().await
    }
}

/// Wall-clock milliseconds since the Unix epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
