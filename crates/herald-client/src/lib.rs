//! # herald-client
//!
//! Network side of herald: the HTTP client for the notification, backup and
//! audit log endpoints, and the Socket.IO push connection.
//!
//! # Example
//!
//! ```ignore
//! use herald_client::{HeraldClient, PushConfig, PushConnection};
//! use herald_core::{HeraldConfig, NotificationApi};
//!
//! let config = HeraldConfig::load()?;
//! let client = HeraldClient::from_config(&config)?;
//! let unread = client.unread_count().await?;
//!
//! let push = PushConnection::new(PushConfig::from_config(&config));
//! let mut events = push.subscribe();
//! let handle = push.start();
//! ```

mod admin_logs;
mod backups;
pub mod client;
pub mod connection;
mod notifications;
pub mod packet;

pub use client::HeraldClient;
pub use connection::{PushConfig, PushConnection, PushHandle};
pub use packet::{EnginePacket, OpenPayload, SocketPacket};
