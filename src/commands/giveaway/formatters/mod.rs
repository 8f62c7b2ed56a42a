pub mod base;
pub mod giveaway;

pub use crate::commands::giveaway::formatters::base::GiveawayFormatter;
pub use crate::commands::giveaway::formatters::giveaway::{
    ANNOUNCEMENT_REACTION, DefaultGiveawayFormatter, format_mentions, format_remaining,
};
