//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! The chat transport publishes every inbound [`TransportEvent`] here;
//! correlators subscribe for as long as they are watching a message.
//! Designed to be shared via `Arc<EventBus>`.

use chrono::Utc;
use mudae_core::types::{MessageRef, Timestamp, UserRef};
use mudae_core::RawMessage;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Something the chat transport observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportEvent {
    /// A new message was posted.
    Message(RawMessage),

    /// A user reacted to a message.
    Reaction(ReactionEvent),

    /// The transport already attributed a claim to a message.
    Claim(ClaimEvent),
}

/// A reaction added to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub message_ref: MessageRef,
    pub user: UserRef,
    pub marker: String,
}

/// A claim attributed to a specific message. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEvent {
    pub message_ref: MessageRef,
    pub claimant: UserRef,
    /// Text of the bot's confirmation.
    pub content: String,
    pub observed_at: Timestamp,
}

impl ClaimEvent {
    /// Create an event observed now.
    pub fn new(message_ref: MessageRef, claimant: UserRef, content: impl Into<String>) -> Self {
        Self {
            message_ref,
            claimant,
            content: content.into(),
            observed_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`TransportEvent`].
///
/// # Usage
///
/// ```rust
/// use mudae_events::bus::{EventBus, ReactionEvent, TransportEvent};
/// use mudae_core::{MessageRef, UserRef};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(TransportEvent::Reaction(ReactionEvent {
///     message_ref: MessageRef::new(1, 2),
///     user: UserRef::new(3, "alice"),
///     marker: "💖".to_string(),
/// }));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<TransportEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed events are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If nobody is watching the event is silently dropped.
    pub fn publish(&self, event: TransportEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
