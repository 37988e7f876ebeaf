//! Capabilities the chat transport provides to this crate.
//!
//! The transport itself (gateway connection, REST calls, rate limits) lives
//! outside this workspace. [`Transport`] is the seam: production code wraps
//! a real chat client, tests use an in-memory fake.

use async_trait::async_trait;
use mudae_core::{ChannelId, MessageRef, RawMessage, Reaction, UserRef};

/// Outbound calls and queries against the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Reactions currently attached to `message`, in the order the platform
    /// reports them.
    async fn get_reactions(&self, message: MessageRef) -> Result<Vec<Reaction>, TransportError>;

    /// Add our own reaction `marker` to `message`.
    async fn send_reaction(&self, message: MessageRef, marker: &str) -> Result<(), TransportError>;

    /// Up to `limit` of the most recent messages in `channel`, newest first.
    async fn recent_messages(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<RawMessage>, TransportError>;

    /// Resolve a display name to a member of the guild owning `channel`.
    async fn member_named(
        &self,
        channel: ChannelId,
        name: &str,
    ) -> Result<Option<UserRef>, TransportError>;
}

/// Errors reported by a [`Transport`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The platform call failed (network, permissions, rate limit).
    #[error("Transport request failed: {0}")]
    Request(String),

    /// The referenced message or channel no longer exists.
    #[error("Not found: {0}")]
    NotFound(String),
}
