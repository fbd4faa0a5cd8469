//! Push connection over Socket.IO.
//!
//! One long-lived WebSocket session per [`PushConnection`]. After the
//! Socket.IO handshake the connection joins the user room (when a user id is
//! configured) and the admin room (for admins), then republishes every
//! `notification` / `admin_notification` event on an [`EventBus`]. When a
//! session ends for any reason other than shutdown, the next attempt starts
//! after a fixed delay.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, COOKIE};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, trace, warn};

use herald_core::{
    defaults, Channel, ConnectionEvent, Error, EventBus, HeraldConfig, IdentityConfig, PushEvent,
    Result,
};

use crate::packet::{connect_error_message, EnginePacket, SocketPacket, ROOT_NAMESPACE};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Liveness window used until the server's `open` packet announces its own.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(45);

/// Configuration for the push connection.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Base URL of the web application (http or https).
    pub base_url: String,
    /// Cookie header sent on the upgrade request.
    pub session_cookie: Option<String>,
    /// Which rooms to join after connecting.
    pub identity: IdentityConfig,
    /// Socket.IO namespace.
    pub namespace: String,
    /// Delay between a dropped session and the next attempt.
    pub reconnect_delay_ms: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::SERVER_URL.to_string(),
            session_cookie: None,
            identity: IdentityConfig::default(),
            namespace: ROOT_NAMESPACE.to_string(),
            reconnect_delay_ms: defaults::RECONNECT_DELAY_MS,
        }
    }
}

impl PushConfig {
    pub fn from_config(config: &HeraldConfig) -> Self {
        Self {
            base_url: config.server.base_url.clone(),
            session_cookie: config.server.session_cookie.clone(),
            identity: config.identity.clone(),
            namespace: ROOT_NAMESPACE.to_string(),
            reconnect_delay_ms: config.connection.reconnect_delay_ms,
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// WebSocket URL of the Engine.IO endpoint.
    pub fn socket_url(&self) -> Result<String> {
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        };
        Ok(format!(
            "{}{}?EIO=4&transport=websocket",
            ws_base,
            defaults::SOCKET_IO_PATH
        ))
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionEnd {
    Shutdown,
    Closed(String),
}

/// Handle for controlling a running push connection.
pub struct PushHandle {
    shutdown_tx: mpsc::Sender<()>,
    events: EventBus<ConnectionEvent>,
    task: JoinHandle<()>,
}

impl PushHandle {
    /// Signal the connection to leave its rooms and close.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Subscribe to connection events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Wait for the connection task to finish after a shutdown.
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Push connection task failed: {}", e)))
    }
}

/// Socket.IO push connection.
pub struct PushConnection {
    config: PushConfig,
    events: EventBus<ConnectionEvent>,
}

impl PushConnection {
    pub fn new(config: PushConfig) -> Self {
        Self {
            config,
            events: EventBus::default(),
        }
    }

    /// Subscribe before `start()` to observe the first `Connected` event.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    /// Spawn the connection loop.
    pub fn start(self) -> PushHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        PushHandle {
            shutdown_tx,
            events,
            task,
        }
    }

    #[instrument(skip(self, shutdown_rx), fields(component = "connection"))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        info!(
            base_url = %self.config.base_url,
            user_id = ?self.config.identity.user_id,
            is_admin = self.config.identity.is_admin,
            "Push connection started"
        );

        loop {
            let reason = match self.session(shutdown_rx).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Closed(reason)) => {
                    info!(reason = %reason, "Push session closed");
                    reason
                }
                Err(e) => {
                    warn!(error = %e, "Push session failed");
                    e.to_string()
                }
            };
            self.events.emit(ConnectionEvent::Disconnected { reason });

            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay()) => {
                    debug!("Reconnecting push session");
                }
                _ = shutdown_rx.recv() => break,
            }
        }

        info!("Push connection stopped");
    }

    /// Run one WebSocket session until it ends or shutdown is requested.
    async fn session(&self, shutdown_rx: &mut mpsc::Receiver<()>) -> Result<SessionEnd> {
        let url = self.config.socket_url()?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::Connection(format!("Invalid socket URL {}: {}", url, e)))?;
        if let Some(ref cookie) = self.config.session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| Error::Config(format!("Invalid session cookie: {}", e)))?;
            request.headers_mut().insert(COOKIE, value);
        }

        let mut socket = tokio::select! {
            connected = connect_async(request) => {
                connected
                    .map_err(|e| Error::Connection(format!("WebSocket connect failed: {}", e)))?
                    .0
            }
            _ = shutdown_rx.recv() => return Ok(SessionEnd::Shutdown),
        };
        debug!(url = %url, "WebSocket established");

        let mut liveness = HANDSHAKE_TIMEOUT;
        let mut joined = false;

        loop {
            let next = tokio::select! {
                next = tokio::time::timeout(liveness, socket.next()) => next,
                _ = shutdown_rx.recv() => {
                    self.leave(&mut socket, joined).await;
                    return Ok(SessionEnd::Shutdown);
                }
            };

            let message = match next {
                Err(_) => return Err(Error::Connection("ping timeout".to_string())),
                Ok(None) => return Ok(SessionEnd::Closed("transport closed".to_string())),
                Ok(Some(Err(e))) => return Err(Error::Connection(format!("WebSocket error: {}", e))),
                Ok(Some(Ok(message))) => message,
            };

            let frame = match message {
                Message::Text(text) => text,
                Message::Close(_) => {
                    return Ok(SessionEnd::Closed("server closed websocket".to_string()))
                }
                _ => continue,
            };
            trace!(frame = %frame, "Engine.IO frame");

            let packet = match EnginePacket::decode(&frame) {
                Ok(packet) => packet,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed frame");
                    continue;
                }
            };

            match packet {
                EnginePacket::Open(open) => {
                    liveness = Duration::from_millis(open.ping_interval + open.ping_timeout);
                    debug!(sid = %open.sid, ping_interval = open.ping_interval, "Engine.IO open");
                    send(&mut socket, SocketPacket::connect(&self.config.namespace).into_frame())
                        .await?;
                }
                EnginePacket::Ping(payload) => {
                    send(&mut socket, EnginePacket::Pong(payload).encode()).await?;
                }
                EnginePacket::Close => {
                    return Ok(SessionEnd::Closed("server closed session".to_string()))
                }
                EnginePacket::Message(payload) => {
                    if let Some(end) = self.on_socket_packet(&mut socket, &payload, &mut joined).await? {
                        return Ok(end);
                    }
                }
                other => trace!(packet = ?other, "Ignoring engine.io packet"),
            }
        }
    }

    async fn on_socket_packet(
        &self,
        socket: &mut Socket,
        payload: &str,
        joined: &mut bool,
    ) -> Result<Option<SessionEnd>> {
        let packet = match SocketPacket::decode(payload) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "Skipping malformed socket.io packet");
                return Ok(None);
            }
        };

        if packet.namespace() != self.config.namespace {
            trace!(namespace = packet.namespace(), "Packet for another namespace");
            return Ok(None);
        }

        match packet {
            SocketPacket::Connect { data, .. } => {
                let sid = data
                    .as_ref()
                    .and_then(|d| d.get("sid"))
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                self.join(socket).await?;
                *joined = true;
                info!(sid = %sid, "Push connection established");
                self.events.emit(ConnectionEvent::Connected { sid });
            }
            SocketPacket::Event { name, args, .. } => self.dispatch(&name, args),
            SocketPacket::Disconnect { .. } => {
                return Ok(Some(SessionEnd::Closed("server disconnect".to_string())))
            }
            SocketPacket::ConnectError { data, .. } => {
                return Err(Error::Connection(format!(
                    "Connection refused: {}",
                    connect_error_message(data.as_ref())
                )))
            }
            SocketPacket::Ack { id, .. } => trace!(id, "Ignoring ack"),
        }
        Ok(None)
    }

    fn dispatch(&self, name: &str, args: Vec<JsonValue>) {
        let Some(channel) = Channel::from_event_name(name) else {
            if name == "room_joined" || name == "room_left" {
                debug!(event = name, room = ?args.first().and_then(|a| a.get("room")), "Room membership");
            } else {
                trace!(event = name, "Unhandled event");
            }
            return;
        };

        let Some(payload) = args.into_iter().next() else {
            warn!(channel = channel.event_name(), "Push event without payload");
            return;
        };

        match serde_json::from_value::<PushEvent>(payload) {
            Ok(event) => {
                debug!(
                    channel = channel.event_name(),
                    kind = %event.kind,
                    "Push notification received"
                );
                self.events
                    .emit(ConnectionEvent::Notification { channel, event });
            }
            Err(e) => warn!(channel = channel.event_name(), error = %e, "Skipping malformed push event"),
        }
    }

    async fn join(&self, socket: &mut Socket) -> Result<()> {
        let ns = &self.config.namespace;
        if let Some(user_id) = self.config.identity.user_id {
            send(
                socket,
                SocketPacket::event(ns, "join_user_room", vec![json!({ "user_id": user_id })])
                    .into_frame(),
            )
            .await?;
            debug!(user_id, "Joining user room");
        }
        if self.config.identity.is_admin {
            send(socket, SocketPacket::event(ns, "join_admin_room", vec![]).into_frame()).await?;
            debug!("Joining admin room");
        }
        Ok(())
    }

    /// Best-effort goodbye on shutdown.
    async fn leave(&self, socket: &mut Socket, joined: bool) {
        let ns = &self.config.namespace;
        let mut frames = Vec::new();
        if joined {
            if let Some(user_id) = self.config.identity.user_id {
                frames.push(
                    SocketPacket::event(ns, "leave_user_room", vec![json!({ "user_id": user_id })])
                        .into_frame(),
                );
            }
            frames.push(
                SocketPacket::Disconnect {
                    namespace: ns.clone(),
                }
                .into_frame(),
            );
        }
        for frame in frames {
            if let Err(e) = send(socket, frame).await {
                debug!(error = %e, "Could not send goodbye frame");
                return;
            }
        }
        let _ = socket.close(None).await;
    }
}

async fn send(socket: &mut Socket, frame: String) -> Result<()> {
    trace!(frame = %frame, "Sending frame");
    socket
        .send(Message::Text(frame))
        .await
        .map_err(|e| Error::Connection(format!("WebSocket send failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url_http() {
        let config = PushConfig {
            base_url: "http://127.0.0.1:5000/".to_string(),
            ..PushConfig::default()
        };
        assert_eq!(
            config.socket_url().unwrap(),
            "ws://127.0.0.1:5000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_socket_url_https() {
        let config = PushConfig {
            base_url: "https://oraculo.example.com".to_string(),
            ..PushConfig::default()
        };
        assert_eq!(
            config.socket_url().unwrap(),
            "wss://oraculo.example.com/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_socket_url_rejects_other_schemes() {
        let config = PushConfig {
            base_url: "ftp://x".to_string(),
            ..PushConfig::default()
        };
        assert!(config.socket_url().is_err());
    }

    #[test]
    fn test_from_config_copies_identity() {
        let mut config = HeraldConfig::default();
        config.identity.user_id = Some(9);
        config.identity.is_admin = true;
        config.connection.reconnect_delay_ms = 250;
        let push = PushConfig::from_config(&config);
        assert_eq!(push.identity.user_id, Some(9));
        assert!(push.identity.is_admin);
        assert_eq!(push.reconnect_delay(), Duration::from_millis(250));
        assert_eq!(push.namespace, "/");
    }

    #[tokio::test]
    async fn test_dispatch_publishes_notification() {
        let connection = PushConnection::new(PushConfig::default());
        let mut rx = connection.subscribe();

        connection.dispatch(
            "admin_notification",
            vec![json!({"type": "info", "message": "Novo usuário cadastrado"})],
        );

        match rx.recv().await.unwrap() {
            ConnectionEvent::Notification { channel, event } => {
                assert_eq!(channel, Channel::Admin);
                assert_eq!(event.message, "Novo usuário cadastrado");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_ignores_room_acks_and_bad_payloads() {
        let connection = PushConnection::new(PushConfig::default());
        let mut rx = connection.subscribe();

        connection.dispatch("room_joined", vec![json!({"room": "user_1"})]);
        connection.dispatch("notification", vec![]);
        connection.dispatch("notification", vec![json!("not an object")]);

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
