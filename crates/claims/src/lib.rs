//! Enrichment and asynchronous claim correlation for Mudae rolls.
//!
//! Provides the [`Transport`] capability seam, the [`fetch_extra`]
//! enrichment step, the [`ClaimCorrelator`] that resolves who claimed a
//! roll, and a reset-sleeping helper for caller scheduling loops.

pub mod confirm;
pub mod correlator;
pub mod enrich;
pub mod error;
pub mod schedule;
pub mod transport;

pub use correlator::{ClaimCorrelator, ClaimOutcome};
pub use enrich::fetch_extra;
pub use error::ClaimError;
pub use schedule::sleep_until_reset;
pub use transport::{Transport, TransportError};
