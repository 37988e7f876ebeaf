//! Wishlist matching.
//!
//! Pure, case-insensitive comparison of a parsed [`Waifu`] against the
//! caller's list of desired characters (and optionally series).

use crate::waifu::Waifu;

/// Which fields of a waifu a wishlist is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WishScope {
    pub name: bool,
    pub series: bool,
}

impl Default for WishScope {
    fn default() -> Self {
        Self {
            name: true,
            series: false,
        }
    }
}

/// Match `waifu`'s name against each wish in order.
///
/// A wish matches when it equals the name or is contained in it, ignoring
/// case. Returns the waifu unchanged on the first match.
pub fn match_wish<S: AsRef<str>>(waifu: Waifu, wishlist: &[S]) -> Option<Waifu> {
    match_wish_with(waifu, wishlist, WishScope::default())
}

/// Like [`match_wish`], checking the fields selected by `scope`. With both
/// fields disabled nothing matches.
pub fn match_wish_with<S: AsRef<str>>(
    waifu: Waifu,
    wishlist: &[S],
    scope: WishScope,
) -> Option<Waifu> {
    let name = waifu.name().to_lowercase();
    let series = waifu.series().to_lowercase();

    let matched = wishlist.iter().any(|wish| {
        let wish = wish.as_ref().trim().to_lowercase();
        if wish.is_empty() {
            return false;
        }
        (scope.name && name.contains(&wish)) || (scope.series && series.contains(&wish))
    });

    matched.then_some(waifu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRef;
    use crate::waifu::{RollDetails, WaifuKind};

    fn saber() -> Waifu {
        Waifu::new(
            "Saber",
            "Fate/stay night",
            120,
            WaifuKind::Roll(RollDetails::default()),
            false,
            MessageRef::new(1, 2),
        )
        .unwrap()
    }

    #[test]
    fn match_is_case_insensitive() {
        assert_eq!(match_wish(saber(), &["saber"]), Some(saber()));
        assert!(match_wish(saber(), &["SABER"]).is_some());
    }

    #[test]
    fn substring_matches() {
        assert!(match_wish(saber(), &["abe"]).is_some());
    }

    #[test]
    fn later_entry_can_match() {
        assert!(match_wish(saber(), &["Rin", "Sakura", "saber"]).is_some());
    }

    #[test]
    fn no_entry_matches() {
        assert!(match_wish(saber(), &["Rin", "Sakura"]).is_none());
    }

    #[test]
    fn empty_wishlist_and_blank_entries_never_match() {
        let empty: [&str; 0] = [];
        assert!(match_wish(saber(), &empty).is_none());
        assert!(match_wish(saber(), &["", "   "]).is_none());
    }

    #[test]
    fn name_scope_ignores_series() {
        assert!(match_wish(saber(), &["fate"]).is_none());
    }

    #[test]
    fn series_scope_matches_series() {
        let scope = WishScope {
            name: false,
            series: true,
        };
        assert!(match_wish_with(saber(), &["fate/stay night"], scope).is_some());
        assert!(match_wish_with(saber(), &["saber"], scope).is_none());
    }

    #[test]
    fn disabled_scope_never_matches() {
        let scope = WishScope {
            name: false,
            series: false,
        };
        assert!(match_wish_with(saber(), &["saber"], scope).is_none());
    }

    #[test]
    fn owned_strings_work() {
        let wishes = vec!["Saber".to_string()];
        assert!(match_wish(saber(), &wishes).is_some());
    }
}
