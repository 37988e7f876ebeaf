use mudae_core::{MessageRef, WaifuType};

use crate::transport::TransportError;

/// Errors that can occur while enriching or correlating a roll.
#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    /// Only roll sightings can be claimed or watched.
    #[error("Expected a roll, got a {0:?}")]
    NotARoll(WaifuType),

    /// Another correlation for the same origin message is still in flight.
    #[error("Already watching message {0}")]
    AlreadyWatching(MessageRef),

    /// The roll belongs to someone before we tried to claim it.
    #[error("{0} is already claimed")]
    AlreadyClaimed(String),

    /// The caller cancelled the correlation before it finished.
    #[error("Correlation cancelled")]
    Cancelled,

    /// The event bus was dropped while we were watching.
    #[error("Event stream closed")]
    EventStreamClosed,

    /// A transport call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
