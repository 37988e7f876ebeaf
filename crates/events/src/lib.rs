//! Inbound event plumbing between the chat transport and the correlators.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`TransportEvent`]: everything the transport delivers (messages,
//!   reactions, attributed claims).
//! - [`ClaimEvent`]: a claim tied to a specific origin message.

pub mod bus;

pub use bus::{ClaimEvent, EventBus, ReactionEvent, TransportEvent};
