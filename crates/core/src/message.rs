//! Transport-neutral model of an incoming chat message.
//!
//! The chat transport converts whatever its gateway delivers into a
//! [`RawMessage`] before handing it to the parser. Only the fields the
//! parser and correlator actually read are modelled; everything else the
//! platform sends is dropped at the boundary.

use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, MessageId, MessageRef, UserRef};

/// One message as delivered by the chat transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: UserRef,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    /// Users mentioned in the message body, in the order they appear.
    #[serde(default)]
    pub mentions: Vec<UserRef>,
    /// The user whose slash command produced this message, if any.
    #[serde(default)]
    pub interaction_user: Option<UserRef>,
    /// The message this one replies to.
    #[serde(default)]
    pub referenced_message: Option<MessageId>,
}

impl RawMessage {
    /// Handle used to scope later correlation to this message.
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            channel: self.channel_id,
            id: self.id,
        }
    }
}

/// Structured visual block attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Accent colour as a 24-bit RGB integer.
    #[serde(default)]
    pub color: Option<u32>,
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A single user's reaction on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub user: UserRef,
    /// Emoji name or unicode emoji used for the reaction.
    pub marker: String,
}
