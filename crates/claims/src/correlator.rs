//! Asynchronous claim correlation.
//!
//! [`ClaimCorrelator`] answers "who ends up owning this roll?" by watching
//! the [`EventBus`] for a confirmation tied to the roll's origin message.
//!
//! Each call moves through `Idle -> Watching -> {Resolved, Expired,
//! Cancelled}`. At most one watch per origin is live at any instant: the
//! registry check-and-insert happens under one lock acquisition, and a
//! second watch on the same origin fails fast with
//! [`ClaimError::AlreadyWatching`]. The registry entry and the bus
//! subscription are owned by a guard, so they are released on every exit
//! path, including the caller dropping the future.
//!
//! The deadline and cancel token bound the whole call, transport lookups
//! included, so a stalled transport cannot keep a watch alive.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use mudae_core::config::DEFAULT_CLAIM_TIMEOUT_SECS;
use mudae_core::{MessageRef, MudaeSettings, ParseContext, UserRef, Waifu};
use mudae_events::{EventBus, TransportEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::confirm::{confirmation_for, is_confirmation};
use crate::enrich::fetch_extra;
use crate::error::ClaimError;
use crate::transport::Transport;

/// Result of a strict [`ClaimCorrelator::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The bot confirmed the roll as ours.
    WeClaimed,
    /// The bot confirmed the roll for someone else.
    OtherClaimed(UserRef),
    /// We reacted but no confirmation arrived before the deadline.
    TimedOut,
}

/// How a step raced against the deadline and the cancel token ended.
#[derive(Debug)]
enum Step<T> {
    Done(T),
    Expired,
    Cancelled,
}

/// Resolves roll ownership from later transport events.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct ClaimCorrelator {
    transport: Arc<dyn Transport>,
    bus: Arc<EventBus>,
    ctx: ParseContext,
    /// Deadline used by [`resolve_claim`](Self::resolve_claim).
    claim_timeout: Duration,
    /// Origins with a live watch.
    watching: Mutex<HashSet<MessageRef>>,
}

impl ClaimCorrelator {
    pub fn new(transport: Arc<dyn Transport>, bus: Arc<EventBus>, ctx: ParseContext) -> Self {
        Self {
            transport,
            bus,
            ctx,
            claim_timeout: Duration::from_secs(DEFAULT_CLAIM_TIMEOUT_SECS),
            watching: Mutex::new(HashSet::new()),
        }
    }

    /// Build from environment-loaded settings, taking both the context and
    /// the claim timeout.
    pub fn from_settings(
        transport: Arc<dyn Transport>,
        bus: Arc<EventBus>,
        settings: MudaeSettings,
    ) -> Self {
        Self {
            claim_timeout: settings.claim_timeout,
            ..Self::new(transport, bus, settings.context)
        }
    }

    pub fn context(&self) -> &ParseContext {
        &self.ctx
    }

    pub fn claim_timeout(&self) -> Duration {
        self.claim_timeout
    }

    /// Whether a watch on `origin` is currently in flight.
    pub fn is_watching(&self, origin: MessageRef) -> bool {
        self.registry().contains(&origin)
    }

    /// Number of watches currently in flight.
    pub fn active_watches(&self) -> usize {
        self.registry().len()
    }

    /// Fill the roll's suitors and creator from the transport.
    pub async fn fetch_extra(&self, waifu: Waifu) -> Result<Waifu, ClaimError> {
        fetch_extra(self.transport.as_ref(), &self.ctx, waifu).await
    }

    /// Wait up to `timeout` for someone to claim `waifu`.
    ///
    /// Returns `Ok(None)` when the deadline passes first, and
    /// [`ClaimError::Cancelled`] when `cancel` fires first. A roll that
    /// already shows an owner resolves without watching. Transport lookups
    /// count against the same deadline and cancel token.
    pub async fn await_claim(
        &self,
        waifu: &Waifu,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Option<UserRef>, ClaimError> {
        if !waifu.is_roll() {
            return Err(ClaimError::NotARoll(waifu.waifu_type()));
        }
        let deadline = Instant::now() + timeout;
        let origin = waifu.origin();

        if waifu.claimed() {
            if let Some(owner) = waifu.owner() {
                let lookup = self.transport.member_named(origin.channel, owner);
                return match bounded(lookup, deadline, cancel).await {
                    Step::Done(member) => Ok(member?),
                    Step::Expired => Ok(None),
                    Step::Cancelled => Err(ClaimError::Cancelled),
                };
            }
        }

        let mut watch = self.begin_watch(origin)?;
        match bounded(self.next_claimant(&mut watch, waifu), deadline, cancel).await {
            Step::Done(claimant) => Ok(Some(claimant?)),
            Step::Expired => {
                tracing::debug!(origin = %origin, "Watch expired");
                Ok(None)
            }
            Step::Cancelled => {
                tracing::debug!(origin = %origin, "Watch cancelled");
                Err(ClaimError::Cancelled)
            }
        }
    }

    /// [`await_claim`](Self::await_claim) with the configured claim timeout,
    /// recording the claimant on the returned waifu.
    pub async fn resolve_claim(
        &self,
        waifu: Waifu,
        cancel: &CancellationToken,
    ) -> Result<Waifu, ClaimError> {
        match self.await_claim(&waifu, self.claim_timeout, cancel).await? {
            Some(claimant) => Ok(waifu.record_claim(&claimant)),
            None => Ok(waifu),
        }
    }

    /// React to claim `waifu`, then wait for the outcome. `timeout` covers
    /// both the reaction and the wait.
    ///
    /// The watch is registered before the reaction is sent so a fast
    /// confirmation cannot slip past.
    pub async fn claim(
        &self,
        waifu: &Waifu,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ClaimOutcome, ClaimError> {
        if !waifu.is_roll() {
            return Err(ClaimError::NotARoll(waifu.waifu_type()));
        }
        if waifu.claimed() {
            return Err(ClaimError::AlreadyClaimed(waifu.name().to_string()));
        }

        let deadline = Instant::now() + timeout;
        let origin = waifu.origin();
        let mut watch = self.begin_watch(origin)?;

        let send = self.transport.send_reaction(origin, &self.ctx.claim_marker);
        match bounded(send, deadline, cancel).await {
            Step::Done(sent) => sent?,
            Step::Expired => {
                tracing::warn!(origin = %origin, name = %waifu.name(), "Claim reaction not sent before deadline");
                return Ok(ClaimOutcome::TimedOut);
            }
            Step::Cancelled => return Err(ClaimError::Cancelled),
        }
        tracing::info!(origin = %origin, name = %waifu.name(), "Claim reaction sent");

        let outcome = match bounded(self.next_claimant(&mut watch, waifu), deadline, cancel).await
        {
            Step::Done(claimant) => {
                let claimant = claimant?;
                if claimant.id == self.ctx.self_id {
                    ClaimOutcome::WeClaimed
                } else {
                    ClaimOutcome::OtherClaimed(claimant)
                }
            }
            Step::Expired => ClaimOutcome::TimedOut,
            Step::Cancelled => return Err(ClaimError::Cancelled),
        };

        match &outcome {
            ClaimOutcome::TimedOut => {
                tracing::warn!(origin = %origin, name = %waifu.name(), "Claim unresolved")
            }
            other => tracing::info!(origin = %origin, name = %waifu.name(), ?other, "Claim resolved"),
        }
        Ok(outcome)
    }

    // ---- private helpers ----

    fn registry(&self) -> std::sync::MutexGuard<'_, HashSet<MessageRef>> {
        self.watching.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Idle -> Watching. Registers `origin` and subscribes in one step.
    fn begin_watch(&self, origin: MessageRef) -> Result<Watch<'_>, ClaimError> {
        let mut registry = self.registry();
        if !registry.insert(origin) {
            tracing::warn!(origin = %origin, "Rejected second watch on the same message");
            return Err(ClaimError::AlreadyWatching(origin));
        }
        let events = self.bus.subscribe();
        drop(registry);

        tracing::debug!(origin = %origin, "Watching for claim");
        Ok(Watch {
            registry: &self.watching,
            origin,
            events,
        })
    }

    /// Receive events until one confirms a claim on `waifu`. Unbounded on
    /// its own; callers race it with [`bounded`].
    async fn next_claimant(
        &self,
        watch: &mut Watch<'_>,
        waifu: &Waifu,
    ) -> Result<UserRef, ClaimError> {
        loop {
            match watch.events.recv().await {
                Ok(event) => {
                    if let Some(claimant) = self.claimant_from(&event, waifu).await? {
                        tracing::info!(
                            origin = %watch.origin,
                            claimant = %claimant,
                            "Claim observed",
                        );
                        return Ok(claimant);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(origin = %watch.origin, skipped, "Claim watcher lagged behind the event bus");
                }
                Err(RecvError::Closed) => return Err(ClaimError::EventStreamClosed),
            }
        }
    }

    /// The claimant named by `event`, if it confirms a claim on `waifu`.
    async fn claimant_from(
        &self,
        event: &TransportEvent,
        waifu: &Waifu,
    ) -> Result<Option<UserRef>, ClaimError> {
        let origin = waifu.origin();
        match event {
            TransportEvent::Claim(claim) => {
                let confirmed =
                    claim.message_ref == origin && is_confirmation(&self.ctx, &claim.content);
                Ok(confirmed.then(|| claim.claimant.clone()))
            }
            TransportEvent::Message(message) => {
                let Some(name) = confirmation_for(&self.ctx, message, waifu) else {
                    return Ok(None);
                };
                if let Some(user) = message
                    .mentions
                    .iter()
                    .find(|user| user.name.eq_ignore_ascii_case(&name))
                {
                    return Ok(Some(user.clone()));
                }
                let member = self.transport.member_named(origin.channel, &name).await?;
                if member.is_none() {
                    tracing::warn!(origin = %origin, name = %name, "Confirmed claimant is not a known member");
                }
                Ok(member)
            }
            TransportEvent::Reaction(_) => Ok(None),
        }
    }
}

/// Race `step` against `deadline` and `cancel`. Cancellation wins ties, so
/// a result that lands together with a cancel is discarded.
async fn bounded<F: Future>(
    step: F,
    deadline: Instant,
    cancel: &CancellationToken,
) -> Step<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Step::Cancelled,
        _ = tokio::time::sleep_until(deadline) => Step::Expired,
        output = step => Step::Done(output),
    }
}

/// A live watch: registry entry plus bus subscription.
struct Watch<'a> {
    registry: &'a Mutex<HashSet<MessageRef>>,
    origin: MessageRef,
    events: broadcast::Receiver<TransportEvent>,
}

impl Drop for Watch<'_> {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.origin);
    }
}
