//! Engine.IO v4 / Socket.IO v5 text packet codec.
//!
//! Only text frames are handled; the backend never sends binary
//! attachments on the notification namespace.
//!
//! Engine.IO frame: one type digit followed by an optional payload.
//! Socket.IO packet (inside an Engine.IO `message`):
//!
//! ```text
//! <type>[/<namespace>,][<ack id>][<json>]
//! ```

use serde::Deserialize;
use serde_json::Value as JsonValue;

use herald_core::{Error, Result};

/// Default Socket.IO namespace.
pub const ROOT_NAMESPACE: &str = "/";

/// Handshake payload of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPayload {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

/// Engine.IO transport-level packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenPayload),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty engine.io frame".to_string()))?;
        let payload = chars.as_str();

        match kind {
            '0' => serde_json::from_str(payload)
                .map(EnginePacket::Open)
                .map_err(|e| Error::Protocol(format!("invalid open payload: {}", e))),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(payload.to_string())),
            '3' => Ok(EnginePacket::Pong(payload.to_string())),
            '4' => Ok(EnginePacket::Message(payload.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(Error::Protocol(format!(
                "unknown engine.io packet type: {}",
                other
            ))),
        }
    }

    /// Encode a client-originated packet.
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(p) => format!("2{}", p),
            EnginePacket::Pong(p) => format!("3{}", p),
            EnginePacket::Message(m) => format!("4{}", m),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

/// Socket.IO packet carried inside an Engine.IO message.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<JsonValue>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        args: Vec<JsonValue>,
    },
    Ack {
        namespace: String,
        id: u64,
        args: Vec<JsonValue>,
    },
    ConnectError {
        namespace: String,
        data: Option<JsonValue>,
    },
}

impl SocketPacket {
    /// CONNECT request for a namespace.
    pub fn connect(namespace: &str) -> Self {
        SocketPacket::Connect {
            namespace: namespace.to_string(),
            data: None,
        }
    }

    /// EVENT without an acknowledgement id.
    pub fn event(namespace: &str, name: &str, args: Vec<JsonValue>) -> Self {
        SocketPacket::Event {
            namespace: namespace.to_string(),
            id: None,
            name: name.to_string(),
            args,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    pub fn decode(payload: &str) -> Result<Self> {
        let mut chars = payload.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty socket.io packet".to_string()))?;
        let mut rest = chars.as_str();

        let mut namespace = ROOT_NAMESPACE.to_string();
        if rest.starts_with('/') {
            let end = rest.find(',').unwrap_or(rest.len());
            namespace = rest[..end].to_string();
            rest = rest.get(end + 1..).unwrap_or("");
        }

        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        let id = if digits > 0 {
            let id = rest[..digits]
                .parse::<u64>()
                .map_err(|e| Error::Protocol(format!("invalid ack id: {}", e)))?;
            rest = &rest[digits..];
            Some(id)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<JsonValue>(rest)
                    .map_err(|e| Error::Protocol(format!("invalid packet data: {}", e)))?,
            )
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut args = match data {
                    Some(JsonValue::Array(items)) => items,
                    _ => return Err(Error::Protocol("event payload is not an array".to_string())),
                };
                if args.is_empty() {
                    return Err(Error::Protocol("event without a name".to_string()));
                }
                let name = match args.remove(0) {
                    JsonValue::String(name) => name,
                    other => {
                        return Err(Error::Protocol(format!("event name is not a string: {}", other)))
                    }
                };
                Ok(SocketPacket::Event {
                    namespace,
                    id,
                    name,
                    args,
                })
            }
            '3' => {
                let id = id.ok_or_else(|| Error::Protocol("ack without an id".to_string()))?;
                let args = match data {
                    Some(JsonValue::Array(items)) => items,
                    _ => Vec::new(),
                };
                Ok(SocketPacket::Ack {
                    namespace,
                    id,
                    args,
                })
            }
            '4' => Ok(SocketPacket::ConnectError { namespace, data }),
            '5' | '6' => Err(Error::Protocol(
                "binary socket.io packets are not supported".to_string(),
            )),
            other => Err(Error::Protocol(format!(
                "unknown socket.io packet type: {}",
                other
            ))),
        }
    }

    pub fn encode(&self) -> String {
        let (kind, id, data) = match self {
            SocketPacket::Connect { data, .. } => ('0', None, data.clone()),
            SocketPacket::Disconnect { .. } => ('1', None, None),
            SocketPacket::Event { id, name, args, .. } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(JsonValue::String(name.clone()));
                items.extend(args.iter().cloned());
                ('2', *id, Some(JsonValue::Array(items)))
            }
            SocketPacket::Ack { id, args, .. } => ('3', Some(*id), Some(JsonValue::Array(args.clone()))),
            SocketPacket::ConnectError { data, .. } => ('4', None, data.clone()),
        };

        let mut out = String::new();
        out.push(kind);
        let namespace = self.namespace();
        if namespace != ROOT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&data.to_string());
        }
        out
    }

    /// Wrap into the Engine.IO frame that goes on the wire.
    pub fn into_frame(self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

/// Human-readable reason carried by a CONNECT_ERROR.
pub fn connect_error_message(data: Option<&JsonValue>) -> String {
    match data {
        Some(JsonValue::Object(map)) => map
            .get("message")
            .and_then(JsonValue::as_str)
            .unwrap_or("connection refused")
            .to_string(),
        Some(JsonValue::String(s)) => s.clone(),
        _ => "connection refused".to_string(),
    }
}
