//! Classify bot messages and extract [`Waifu`] sightings from them.
//!
//! The bot's layouts are not a protocol, so this is a best-effort heuristic:
//! anything that does not look like a character embed yields `None`, which
//! is the expected outcome for most messages in a busy channel.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::ParseContext;
use crate::message::{Embed, RawMessage};
use crate::waifu::{Gallery, Ranks, RollDetails, Waifu, WaifuKind, WaifuType};

// ---------------------------------------------------------------------------
// Layout patterns
// ---------------------------------------------------------------------------

/// First description line, up to the first custom emoji.
static SERIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^<\n]*)").expect("valid regex"));

/// Bold kakera value followed by the kakera emoji, e.g. `**120**<:kakera:123>`.
static KAKERA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(\d+)\*\*\s*<a?:\w+:\d+>").expect("valid regex"));

/// Info layout: series, gender emoji, kakera, optional key level, ranks.
static INFO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xs)
        ^(.*?)\ <a?:\w+:\d+>   # series, then the gender emoji
        .*?\*\*(\d+)\*\*       # kakera
        [^(]*                  # stop at a bracket so the key can be captured
        (?:\((\d+)\))?         # optional key level
        .*?Claims:\ \#(\d+)    # claims rank
        .*?Likes:\ \#(\d+)     # likes rank
        ",
    )
    .expect("valid regex")
});

/// Footer: optional owner, optional separator, optional image position.
static FOOTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Belongs to (.+?))?(?: ~~ )?(?:(\d+) / (\d+)(?: \[(\d+)\])?)?$")
        .expect("valid regex")
});

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Turns raw messages into [`Waifu`]s using an explicit [`ParseContext`].
#[derive(Debug, Clone)]
pub struct MessageParser {
    ctx: ParseContext,
}

impl MessageParser {
    pub fn new(ctx: ParseContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ParseContext {
        &self.ctx
    }

    /// Parse one message. Returns `None` for anything that is not a
    /// recognizable character embed posted by the bot.
    pub fn parse(&self, message: &RawMessage) -> Option<Waifu> {
        if message.author.id != self.ctx.bot_id {
            return None;
        }
        let [embed] = message.embeds.as_slice() else {
            return None;
        };

        let waifu_type = self.classify(message, embed);
        let claimed = embed
            .color
            .is_some_and(|color| self.ctx.claimed_palette.contains(&color));

        let Some(fields) = extract_fields(embed) else {
            tracing::debug!(
                message_id = %message.id,
                "Bot embed did not match a character layout",
            );
            return None;
        };

        let kind = match waifu_type {
            WaifuType::Roll => WaifuKind::Roll(RollDetails::new(message.interaction_user.clone())),
            WaifuType::Wish => WaifuKind::Wish {
                wished_by: message.mentions.clone(),
            },
            WaifuType::Marriage => WaifuKind::Marriage,
        };

        let mut waifu = Waifu::new(
            fields.name,
            fields.series,
            fields.kakera,
            kind,
            claimed,
            message.message_ref(),
        )
        .ok()?;

        if let Some(ranks) = fields.ranks {
            waifu = waifu.with_ranks(ranks);
        }
        if let Some(url) = &embed.image_url {
            waifu = waifu.with_image(url.clone());
        }
        if let Some(footer) = embed.footer.as_deref() {
            let parsed = parse_footer(footer);
            if let Some(owner) = parsed.owner {
                waifu = waifu.with_owner(owner);
            }
            if let Some(gallery) = parsed.gallery {
                waifu = waifu.with_gallery(gallery);
            }
        }

        tracing::debug!(
            message_id = %message.id,
            name = %waifu.name(),
            waifu_type = ?waifu.waifu_type(),
            claimed = waifu.claimed(),
            "Parsed waifu",
        );
        Some(waifu)
    }

    /// Decide the sighting type from the message's markers.
    fn classify(&self, message: &RawMessage, embed: &Embed) -> WaifuType {
        let content = message.content.to_lowercase();
        let footer = embed.footer.as_deref().unwrap_or_default().to_lowercase();
        let has = |marker: &str| {
            let marker = marker.to_lowercase();
            content.contains(&marker) || footer.contains(&marker)
        };

        if has(self.ctx.wish_marker.as_str()) {
            WaifuType::Wish
        } else if self.ctx.marriage_markers.iter().any(|m| has(m.as_str())) {
            WaifuType::Marriage
        } else {
            WaifuType::Roll
        }
    }
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

struct EmbedFields {
    name: String,
    series: String,
    kakera: u32,
    ranks: Option<Ranks>,
}

/// Positional extraction of name, series and kakera. Any missing required
/// field fails the whole extraction.
fn extract_fields(embed: &Embed) -> Option<EmbedFields> {
    let name = embed
        .author_name
        .as_deref()
        .or(embed.title.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())?
        .to_string();
    let description = embed.description.as_deref()?;

    if let Some(caps) = INFO_RE.captures(description) {
        let series = caps[1].replace('\n', " ").trim().to_string();
        let kakera = caps[2].parse().ok()?;
        let ranks = Ranks {
            claims: caps[4].parse().ok()?,
            likes: caps[5].parse().ok()?,
            key: caps
                .get(3)
                .and_then(|key| key.as_str().parse().ok())
                .unwrap_or(0),
        };
        return Some(EmbedFields {
            name,
            series,
            kakera,
            ranks: Some(ranks),
        });
    }

    let series = SERIES_RE
        .captures(description)
        .map(|caps| caps[1].trim().to_string())
        .filter(|series| !series.is_empty())?;
    let kakera = KAKERA_RE.captures(description)?[1].parse().ok()?;

    Some(EmbedFields {
        name,
        series,
        kakera,
        ranks: None,
    })
}

#[derive(Debug, Default, PartialEq)]
struct FooterFields {
    owner: Option<String>,
    gallery: Option<Gallery>,
}

fn parse_footer(footer: &str) -> FooterFields {
    let Some(caps) = FOOTER_RE.captures(footer.trim()) else {
        return FooterFields::default();
    };

    let number = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());
    let gallery = match (number(2), number(3)) {
        (Some(index), Some(count)) => Some(Gallery {
            index,
            count,
            extra: number(4).unwrap_or(0),
        }),
        _ => None,
    };

    FooterFields {
        owner: caps.get(1).map(|m| m.as_str().to_string()),
        gallery,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
