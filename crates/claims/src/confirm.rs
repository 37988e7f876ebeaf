//! Recognition of the bot's claim confirmations.
//!
//! When a roll is claimed the bot posts something like
//! `💖 **alice** and **Saber** are now married! 💖`. The first bold span is
//! the claimant's display name.

use std::sync::LazyLock;

use mudae_core::{ParseContext, RawMessage, Waifu};
use regex::Regex;

/// First bold span of a message.
static CLAIMANT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));

/// Whether `content` carries the bot's confirmation marker.
pub fn is_confirmation(ctx: &ParseContext, content: &str) -> bool {
    content
        .to_lowercase()
        .contains(&ctx.confirmation_marker.to_lowercase())
}

/// Display name of the claimant in a confirmation text.
pub fn claimant_name(ctx: &ParseContext, content: &str) -> Option<String> {
    if !is_confirmation(ctx, content) {
        return None;
    }
    CLAIMANT_RE
        .captures(content)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Claimant name if `message` is a bot confirmation about `waifu`.
///
/// A confirmation counts when it is posted by the bot in the origin channel
/// and either replies to the origin message or, lacking a reply reference,
/// names the waifu.
pub fn confirmation_for(ctx: &ParseContext, message: &RawMessage, waifu: &Waifu) -> Option<String> {
    let origin = waifu.origin();
    if message.author.id != ctx.bot_id || message.channel_id != origin.channel {
        return None;
    }

    let about_waifu = match message.referenced_message {
        Some(reply_to) => reply_to == origin.id,
        None => message.content.contains(waifu.name()),
    };
    if !about_waifu {
        return None;
    }

    claimant_name(ctx, &message.content)
}
