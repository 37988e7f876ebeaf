//! Sleeping until the bot's next reset.
//!
//! [`TimingConfig`] only computes durations; this is the thin tokio layer a
//! caller's loop uses to actually wait for them, respecting a
//! [`CancellationToken`].

use chrono::Utc;
use mudae_core::{ResetKind, TimingConfig};
use tokio_util::sync::CancellationToken;

/// Sleep until just past the next reset of `kind`.
///
/// Returns `true` once the reset has passed, or `false` if `cancel` fired
/// first.
pub async fn sleep_until_reset(
    config: &TimingConfig,
    kind: ResetKind,
    cancel: &CancellationToken,
) -> bool {
    let wait = config.wait_for(kind, Utc::now());
    tracing::info!(
        ?kind,
        wait_secs = wait.as_secs(),
        "Sleeping until next reset",
    );

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::info!(?kind, "Reset wait cancelled");
            false
        }
        _ = tokio::time::sleep(wait) => true,
    }
}
