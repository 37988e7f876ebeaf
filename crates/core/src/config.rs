//! Explicit bot context and environment-driven settings.
//!
//! Nothing in this workspace reads global client state: every parse and
//! correlation call receives a [`ParseContext`] naming the bot account, our
//! own account, the colour palette that means "claimed", and the reaction
//! markers the bot understands.
//!
//! # Environment variables
//!
//! | Variable                   | Required | Default              | Description |
//! |----------------------------|----------|----------------------|-------------|
//! | `MUDAE_SELF_ID`            | yes      | --                   | Our own user id, used to tell our claims apart |
//! | `MUDAE_BOT_ID`             | no       | `432610292342587392` | User id of the bot account |
//! | `MUDAE_CLAIMED_COLORS`     | no       | `0x670C08`           | Comma-separated accent colours meaning "claimed" (hex `0x..` or decimal) |
//! | `MUDAE_CLAIM_MARKER`       | no       | `💖`                 | Reaction sent to claim a roll |
//! | `MUDAE_CLAIM_TIMEOUT_SECS` | no       | `60`                 | How long to wait for a claim to resolve |

use std::time::Duration;

use crate::error::CoreError;
use crate::types::UserId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// User id of the public bot account.
pub const MUDAE_BOT_ID: u64 = 432_610_292_342_587_392;

/// Embed accent colour the bot uses for characters that already belong to
/// someone.
pub const CLAIMED_COLOR: u32 = 0x670C08;

/// Reaction we send to claim a roll.
pub const DEFAULT_CLAIM_MARKER: &str = "💖";

/// Reactions that count as claim intent when collecting suitors.
pub const DEFAULT_CLAIM_INTENT_MARKERS: &[&str] = &["💖", "💗", "💘", "❤️", "💓", "💕", "♥️"];

/// Marker that turns a sighting into a wish announcement.
pub const DEFAULT_WISH_MARKER: &str = "wished by";

/// Markers that turn a sighting into a marriage. An owner footer
/// ("Belongs to X") only marks a sighting as claimed.
pub const DEFAULT_MARRIAGE_MARKERS: &[&str] = &["married"];

/// Text the bot posts when a claim succeeds.
pub const DEFAULT_CONFIRMATION_MARKER: &str = "are now married";

/// Default time to wait for a claim to resolve.
pub const DEFAULT_CLAIM_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// ParseContext
// ---------------------------------------------------------------------------

/// Everything the parser and correlator need to know about the bot and us.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseContext {
    pub bot_id: UserId,
    pub self_id: UserId,
    /// Fixed lookup table of accent colours meaning "already claimed".
    pub claimed_palette: Vec<u32>,
    pub claim_marker: String,
    pub claim_intent_markers: Vec<String>,
    pub wish_marker: String,
    pub marriage_markers: Vec<String>,
    pub confirmation_marker: String,
}

impl ParseContext {
    /// Context with the bot's default palette and markers.
    pub fn new(bot_id: UserId, self_id: UserId) -> Self {
        Self {
            bot_id,
            self_id,
            claimed_palette: vec![CLAIMED_COLOR],
            claim_marker: DEFAULT_CLAIM_MARKER.to_string(),
            claim_intent_markers: DEFAULT_CLAIM_INTENT_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            wish_marker: DEFAULT_WISH_MARKER.to_string(),
            marriage_markers: DEFAULT_MARRIAGE_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            confirmation_marker: DEFAULT_CONFIRMATION_MARKER.to_string(),
        }
    }

    pub fn with_claimed_palette(mut self, palette: Vec<u32>) -> Self {
        self.claimed_palette = palette;
        self
    }

    pub fn with_claim_marker(mut self, marker: impl Into<String>) -> Self {
        self.claim_marker = marker.into();
        self
    }

    /// Whether a reaction marker expresses intent to claim.
    pub fn is_claim_intent(&self, marker: &str) -> bool {
        marker == self.claim_marker || self.claim_intent_markers.iter().any(|m| m == marker)
    }
}

// ---------------------------------------------------------------------------
// MudaeSettings
// ---------------------------------------------------------------------------

/// Settings loaded from the process environment.
#[derive(Debug, Clone, PartialEq)]
pub struct MudaeSettings {
    pub context: ParseContext,
    pub claim_timeout: Duration,
}

impl MudaeSettings {
    /// Read settings from the environment. Callers that want `.env`
    /// support load it first.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let self_id = lookup("MUDAE_SELF_ID")
            .ok_or_else(|| CoreError::Config("MUDAE_SELF_ID is required".to_string()))
            .and_then(|raw| parse_id("MUDAE_SELF_ID", &raw))?;

        let bot_id = match lookup("MUDAE_BOT_ID") {
            Some(raw) => parse_id("MUDAE_BOT_ID", &raw)?,
            None => MUDAE_BOT_ID,
        };

        let mut context = ParseContext::new(UserId(bot_id), UserId(self_id));

        if let Some(raw) = lookup("MUDAE_CLAIMED_COLORS") {
            context = context.with_claimed_palette(parse_palette(&raw)?);
        }
        if let Some(marker) = lookup("MUDAE_CLAIM_MARKER").filter(|m| !m.trim().is_empty()) {
            context = context.with_claim_marker(marker.trim());
        }

        let timeout_secs = match lookup("MUDAE_CLAIM_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                CoreError::Config(format!(
                    "MUDAE_CLAIM_TIMEOUT_SECS must be a whole number of seconds (got {raw})"
                ))
            })?,
            None => DEFAULT_CLAIM_TIMEOUT_SECS,
        };

        Ok(Self {
            context,
            claim_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_id(key: &str, raw: &str) -> Result<u64, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Config(format!("{key} must be a numeric user id (got {raw})")))
}

/// Parse a comma-separated list of colours, each hex (`0x...`, `#...`) or
/// decimal.
fn parse_palette(raw: &str) -> Result<Vec<u32>, CoreError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let parsed = if let Some(hex) = entry
                .strip_prefix("0x")
                .or_else(|| entry.strip_prefix("0X"))
                .or_else(|| entry.strip_prefix('#'))
            {
                u32::from_str_radix(hex, 16)
            } else {
                entry.parse()
            };
            parsed.map_err(|_| CoreError::Config(format!("Invalid colour in palette: {entry}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<MudaeSettings, CoreError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MudaeSettings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn self_id_is_required() {
        let err = settings(&[]).unwrap_err();
        assert!(err.to_string().contains("MUDAE_SELF_ID"));
    }

    #[test]
    fn defaults_apply() {
        let s = settings(&[("MUDAE_SELF_ID", "42")]).unwrap();
        assert_eq!(s.context.self_id, UserId(42));
        assert_eq!(s.context.bot_id, UserId(MUDAE_BOT_ID));
        assert_eq!(s.context.claimed_palette, vec![CLAIMED_COLOR]);
        assert_eq!(s.context.claim_marker, DEFAULT_CLAIM_MARKER);
        assert_eq!(s.claim_timeout, Duration::from_secs(60));
    }

    #[test]
    fn palette_accepts_hex_and_decimal() {
        let s = settings(&[
            ("MUDAE_SELF_ID", "42"),
            ("MUDAE_CLAIMED_COLORS", "0x670C08, 16751916,#00FF00"),
        ])
        .unwrap();
        assert_eq!(s.context.claimed_palette, vec![0x670C08, 0xFF9D2C, 0x00FF00]);
    }

    #[test]
    fn invalid_palette_is_rejected() {
        let result = settings(&[("MUDAE_SELF_ID", "42"), ("MUDAE_CLAIMED_COLORS", "red")]);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let result = settings(&[("MUDAE_SELF_ID", "42"), ("MUDAE_CLAIM_TIMEOUT_SECS", "soon")]);
        assert!(result.is_err());
    }

    #[test]
    fn claim_marker_counts_as_intent() {
        let ctx = ParseContext::new(UserId(1), UserId(2)).with_claim_marker("kiss");
        assert!(ctx.is_claim_intent("kiss"));
        assert!(ctx.is_claim_intent("💘"));
        assert!(!ctx.is_claim_intent("👍"));
    }
}
