use chrono::{DateTime, Utc};

use crate::commands::giveaway::models::{EntrantId, Giveaway, Resolution};

pub trait GiveawayFormatter: Send + Sync {
    // The announcement posted when the giveaway starts. Edited with the
    // remaining time while the giveaway is running.
    fn announcement(&self, giveaway: &Giveaway, now: DateTime<Utc>) -> String;
    // Posted once when less than a minute remains.
    fn one_minute_warning(&self, giveaway: &Giveaway) -> String;
    // A single frame of the final countdown.
    fn countdown(&self, giveaway: &Giveaway, seconds_left: u64) -> String;
    // Replaces the announcement after the winners were drawn.
    fn summary(&self, giveaway: &Giveaway, resolution: &Resolution) -> String;
    // Posted to the channel when the giveaway has been resolved.
    fn resolution(&self, giveaway: &Giveaway, resolution: &Resolution) -> String;
    fn reroll(&self, giveaway: &Giveaway, winners: &[EntrantId]) -> String;
    fn cancelled(&self, giveaway: &Giveaway) -> String;
}
