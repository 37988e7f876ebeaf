//! The parsed gacha character sighting.
//!
//! A [`Waifu`] is produced by [`MessageParser`](crate::parser::MessageParser)
//! and is immutable afterwards, except for the enrichment fields (`creator`,
//! `suitors`, `claimed`/`owner`) which are filled at most once and never
//! retracted.

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{MessageRef, UserRef};

/// Plain tag describing how a sighting arose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaifuType {
    Roll,
    Wish,
    Marriage,
}

/// Per-type payload. Roll-only state lives inside [`WaifuKind::Roll`], so a
/// `Wish` or `Marriage` can never carry a creator or suitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WaifuKind {
    Roll(RollDetails),
    Wish { wished_by: Vec<UserRef> },
    Marriage,
}

/// Roll-only state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollDetails {
    creator: Option<UserRef>,
    suitors: Vec<UserRef>,
    enriched: bool,
}

impl RollDetails {
    pub fn new(creator: Option<UserRef>) -> Self {
        Self {
            creator,
            suitors: Vec::new(),
            enriched: false,
        }
    }
}

/// Image position shown in the footer, e.g. `2 / 7 [1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gallery {
    pub index: u32,
    pub count: u32,
    /// Images added on top of the bot's defaults.
    pub extra: u32,
}

/// Popularity ranks shown by the info layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ranks {
    pub claims: u32,
    pub likes: u32,
    /// Key level, `0` when the layout shows none.
    pub key: u32,
}

/// A parsed gacha character sighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Waifu {
    name: String,
    series: String,
    kakera: u32,
    claimed: bool,
    origin: MessageRef,
    owner: Option<String>,
    image: Option<String>,
    gallery: Option<Gallery>,
    ranks: Option<Ranks>,
    kind: WaifuKind,
}

impl Waifu {
    /// Build a sighting from its required fields.
    ///
    /// Name and series must be non-blank.
    pub fn new(
        name: impl Into<String>,
        series: impl Into<String>,
        kakera: u32,
        kind: WaifuKind,
        claimed: bool,
        origin: MessageRef,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        let series = series.into();
        if name.trim().is_empty() {
            return Err(CoreError::Validation("Waifu name must not be empty".to_string()));
        }
        if series.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Series of {name} must not be empty"
            )));
        }
        Ok(Self {
            name,
            series,
            kakera,
            claimed,
            origin,
            owner: None,
            image: None,
            gallery: None,
            ranks: None,
            kind,
        })
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn with_gallery(mut self, gallery: Gallery) -> Self {
        self.gallery = Some(gallery);
        self
    }

    pub fn with_ranks(mut self, ranks: Ranks) -> Self {
        self.ranks = Some(ranks);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn series(&self) -> &str {
        &self.series
    }

    pub fn kakera(&self) -> u32 {
        self.kakera
    }

    pub fn claimed(&self) -> bool {
        self.claimed
    }

    pub fn origin(&self) -> MessageRef {
        self.origin
    }

    /// Display name of the harem owner, when known.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn gallery(&self) -> Option<Gallery> {
        self.gallery
    }

    pub fn ranks(&self) -> Option<Ranks> {
        self.ranks
    }

    pub fn kind(&self) -> &WaifuKind {
        &self.kind
    }

    pub fn waifu_type(&self) -> WaifuType {
        match self.kind {
            WaifuKind::Roll(_) => WaifuType::Roll,
            WaifuKind::Wish { .. } => WaifuType::Wish,
            WaifuKind::Marriage => WaifuType::Marriage,
        }
    }

    pub fn is_roll(&self) -> bool {
        matches!(self.kind, WaifuKind::Roll(_))
    }

    /// Who rolled this waifu. Always `None` for non-roll sightings.
    pub fn creator(&self) -> Option<&UserRef> {
        match &self.kind {
            WaifuKind::Roll(details) => details.creator.as_ref(),
            _ => None,
        }
    }

    /// Users who reacted with claim intent. Empty until enriched.
    pub fn suitors(&self) -> &[UserRef] {
        match &self.kind {
            WaifuKind::Roll(details) => &details.suitors,
            _ => &[],
        }
    }

    /// Users named by a wish announcement. Empty for other types.
    pub fn wished_by(&self) -> &[UserRef] {
        match &self.kind {
            WaifuKind::Wish { wished_by } => wished_by,
            _ => &[],
        }
    }

    pub fn is_enriched(&self) -> bool {
        matches!(&self.kind, WaifuKind::Roll(details) if details.enriched)
    }

    /// Fill the roll-only enrichment fields.
    ///
    /// A no-op for non-roll sightings and for rolls that were already
    /// enriched. An existing creator is never overwritten.
    pub fn enrich(mut self, creator: Option<UserRef>, suitors: Vec<UserRef>) -> Self {
        if let WaifuKind::Roll(details) = &mut self.kind {
            if details.enriched {
                return self;
            }
            if details.creator.is_none() {
                details.creator = creator;
            }
            details.suitors = suitors;
            details.enriched = true;
        }
        self
    }

    /// Mark the waifu as claimed by `claimant`. Once claimed, later calls
    /// leave the first owner in place.
    pub fn record_claim(mut self, claimant: &UserRef) -> Self {
        if !self.claimed {
            self.claimed = true;
            self.owner = Some(claimant.name.clone());
        }
        self
    }
}

impl fmt::Display for Waifu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
