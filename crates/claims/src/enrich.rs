//! The separately awaited enrichment step for rolls.
//!
//! Parsing sees a single message; who rolled and who reacted with claim
//! intent need extra round-trips to the transport, so they are filled in
//! here rather than by the parser.

use std::collections::HashSet;

use mudae_core::{ParseContext, RawMessage, UserId, UserRef, Waifu};

use crate::error::ClaimError;
use crate::transport::Transport;

/// How many recent channel messages to scan for the roll's creator.
pub const HISTORY_LIMIT: usize = 10;

/// How many messages older than the roll may still be its command.
const CREATOR_LOOKBACK: usize = 4;

/// Fill `suitors` (and `creator`, when the parser could not see it) on a
/// roll.
///
/// Non-roll and already enriched waifus are returned unchanged without
/// touching the transport.
pub async fn fetch_extra(
    transport: &dyn Transport,
    ctx: &ParseContext,
    waifu: Waifu,
) -> Result<Waifu, ClaimError> {
    if !waifu.is_roll() || waifu.is_enriched() {
        return Ok(waifu);
    }

    let origin = waifu.origin();
    let reactions = transport.get_reactions(origin).await?;

    let mut seen = HashSet::new();
    let suitors: Vec<UserRef> = reactions
        .into_iter()
        .filter(|reaction| reaction.user.id != ctx.bot_id && ctx.is_claim_intent(&reaction.marker))
        .filter(|reaction| seen.insert(reaction.user.id))
        .map(|reaction| reaction.user)
        .collect();

    let creator = if waifu.creator().is_none() {
        let history = transport
            .recent_messages(origin.channel, HISTORY_LIMIT)
            .await?;
        find_creator(&history, &waifu, ctx.bot_id)
    } else {
        None
    };

    tracing::debug!(
        origin = %origin,
        name = %waifu.name(),
        suitors = suitors.len(),
        creator = ?creator.as_ref().map(|c| c.name.as_str()),
        "Enriched roll",
    );

    Ok(waifu.enrich(creator, suitors))
}

/// The author of the first non-bot message posted shortly before the roll.
///
/// `history` is newest first.
fn find_creator(history: &[RawMessage], waifu: &Waifu, bot_id: UserId) -> Option<UserRef> {
    history
        .iter()
        .skip_while(|message| message.id != waifu.origin().id)
        .skip(1)
        .take(CREATOR_LOOKBACK)
        .find(|message| message.author.id != bot_id)
        .map(|message| message.author.clone())
}
