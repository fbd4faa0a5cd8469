//! Broadcast event bus used as the subscription seam between components.
//!
//! The push connection publishes [`ConnectionEvent`]s and the toast renderer
//! publishes toast lifecycle events through the same bus type. Each
//! subscriber gets its own independent stream; emitting with no subscribers
//! is not an error.

use tokio::sync::broadcast;

use crate::models::PushEvent;

/// Push channel an event arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// User-scoped `notification` event.
    General,
    /// Admin-scoped `admin_notification` event.
    Admin,
}

impl Channel {
    /// Socket.IO event name for this channel.
    pub fn event_name(&self) -> &'static str {
        match self {
            Channel::General => "notification",
            Channel::Admin => "admin_notification",
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "notification" => Some(Channel::General),
            "admin_notification" => Some(Channel::Admin),
            _ => None,
        }
    }
}

/// Events published by the push connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// Handshake completed and room joins were sent.
    Connected { sid: String },
    /// A push notification arrived.
    Notification { channel: Channel, event: PushEvent },
    /// The session ended; a reconnect follows unless shutting down.
    Disconnected { reason: String },
}

/// Multi-subscriber broadcast bus.
#[derive(Debug, Clone)]
pub struct EventBus<E: Clone> {
    tx: broadcast::Sender<E>,
}

impl<E: Clone + std::fmt::Debug> EventBus<E> {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    pub fn emit(&self, event: E) {
        tracing::trace!(
            subscriber_count = self.tx.receiver_count(),
            ?event,
            "EventBus emit"
        );
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<E: Clone + std::fmt::Debug> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
