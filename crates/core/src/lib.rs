//! Domain core for interpreting the Mudae gacha bot.
//!
//! Zero internal dependencies: parsing, wish matching, and reset timing are
//! pure functions over the types defined here, so they can be shared by the
//! correlation crate and any binary.

pub mod config;
pub mod error;
pub mod message;
pub mod parser;
pub mod timing;
pub mod types;
pub mod waifu;
pub mod wish;

pub use config::{MudaeSettings, ParseContext};
pub use error::CoreError;
pub use message::{Embed, RawMessage, Reaction};
pub use parser::MessageParser;
pub use timing::{ResetKind, TimingConfig, TimingRecord};
pub use types::{ChannelId, MessageId, MessageRef, Timestamp, UserId, UserRef};
pub use waifu::{Gallery, Ranks, RollDetails, Waifu, WaifuKind, WaifuType};
pub use wish::{match_wish, match_wish_with, WishScope};
