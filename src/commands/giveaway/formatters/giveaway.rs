// Discord flavoured output for the giveaway notifications
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::commands::giveaway::formatters::base::GiveawayFormatter;
use crate::commands::giveaway::models::{EntrantId, Giveaway, Resolution};

pub const ANNOUNCEMENT_REACTION: &str = "🎉";

pub struct DefaultGiveawayFormatter;

impl DefaultGiveawayFormatter {
    pub fn new() -> Self {
        DefaultGiveawayFormatter {}
    }
}

// Converts a list of users into Discord mentions.
pub fn format_mentions(users: &[EntrantId]) -> String {
    users
        .iter()
        .map(|user_id| format!("<@{}>", user_id))
        .collect::<Vec<String>>()
        .join(", ")
}

// Human readable remaining time with the minute precision, or seconds
// during the last minute.
pub fn format_remaining(remaining: Duration) -> String {
    let total_seconds = remaining.as_secs();
    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let total_minutes = total_seconds / 60;
    let (days, hours, minutes) = (
        total_minutes / (60 * 24),
        total_minutes / 60 % 24,
        total_minutes % 60,
    );
    match (days, hours) {
        (0, 0) => format!("{}m", minutes),
        (0, _) => format!("{}h {}m", hours, minutes),
        _ => format!("{}d {}h {}m", days, hours, minutes),
    }
}

impl GiveawayFormatter for DefaultGiveawayFormatter {
    fn announcement(&self, giveaway: &Giveaway, now: DateTime<Utc>) -> String {
        let end_timestamp = giveaway.end_time().timestamp();
        let mut lines = vec![
            format!("🎉 **Giveaway: {}** 🎉", giveaway.prize()),
            format!("Winners: {}", giveaway.winner_count()),
            format!("Ends: <t:{}:F> (<t:{}:R>)", end_timestamp, end_timestamp),
        ];

        if let Some(role) = giveaway.role_filter() {
            lines.push(format!("Only members with <@&{}> can join", role));
        }

        let remaining = giveaway.remaining(now).unwrap_or_default();
        lines.push(format!("Time left: {}", format_remaining(remaining)));
        lines.push(format!("Hosted by <@{}>", giveaway.host_id()));
        lines.push(format!(
            "React with {} or use `/giveaway join {}` to enter!",
            ANNOUNCEMENT_REACTION,
            giveaway.id()
        ));
        lines.join("\n")
    }

    fn one_minute_warning(&self, giveaway: &Giveaway) -> String {
        format!(
            "⏰ The giveaway **{}** ends in 1 minute! Join now!",
            giveaway.prize()
        )
    }

    fn countdown(&self, giveaway: &Giveaway, seconds_left: u64) -> String {
        format!(
            "⏱️ The giveaway **{}** ends in {} seconds!",
            giveaway.prize(),
            seconds_left
        )
    }

    fn summary(&self, giveaway: &Giveaway, resolution: &Resolution) -> String {
        let result = match resolution {
            Resolution::Winners(winners) => format!("Winners: {}", format_mentions(winners)),
            Resolution::NoParticipants => "Nobody has joined the giveaway.".to_string(),
        };

        format!(
            "🏆 **Giveaway ended: {}**\n{}\nParticipants: {}\nHosted by <@{}>",
            giveaway.prize(),
            result,
            giveaway.participants().len(),
            giveaway.host_id()
        )
    }

    fn resolution(&self, giveaway: &Giveaway, resolution: &Resolution) -> String {
        match resolution {
            Resolution::Winners(winners) if winners.len() < giveaway.winner_count() => format!(
                "🏆 The giveaway **{}** has ended! Not enough participants, so everyone \
                 who joined wins: {}!",
                giveaway.prize(),
                format_mentions(winners)
            ),
            Resolution::Winners(winners) => format!(
                "🏆 The giveaway **{}** has ended! Congratulations {}!",
                giveaway.prize(),
                format_mentions(winners)
            ),
            Resolution::NoParticipants => format!(
                "😢 The giveaway **{}** has ended without participants.",
                giveaway.prize()
            ),
        }
    }

    fn reroll(&self, giveaway: &Giveaway, winners: &[EntrantId]) -> String {
        format!(
            "🔁 New winners of the giveaway **{}**: {}!",
            giveaway.prize(),
            format_mentions(winners)
        )
    }

    fn cancelled(&self, giveaway: &Giveaway) -> String {
        format!("❌ The giveaway **{}** has been cancelled.", giveaway.prize())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use crate::commands::giveaway::formatters::{
        DefaultGiveawayFormatter, GiveawayFormatter, format_mentions, format_remaining,
    };
    use crate::commands::giveaway::models::{Giveaway, GiveawayRequest, Resolution};

    fn get_giveaway() -> Giveaway {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        let end_time = Utc.with_ymd_and_hms(2030, 1, 1, 12, 5, 0).unwrap();
        let request = GiveawayRequest::new(1, 100, "Steam key", end_time)
            .with_winner_count(2)
            .with_role_filter(Some(55));
        Giveaway::new(request, now)
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::from_secs(0)), "0s");
        assert_eq!(format_remaining(Duration::from_secs(45)), "45s");
        assert_eq!(format_remaining(Duration::from_secs(61)), "1m");
        assert_eq!(format_remaining(Duration::from_secs(2 * 3600 + 5 * 60)), "2h 5m");
        assert_eq!(
            format_remaining(Duration::from_secs(26 * 3600 + 60)),
            "1d 2h 1m"
        );
    }

    #[test]
    fn test_format_mentions() {
        assert_eq!(format_mentions(&[]), "");
        assert_eq!(format_mentions(&[1, 2]), "<@1>, <@2>");
    }

    #[test]
    fn test_announcement_contains_giveaway_details() {
        let giveaway = get_giveaway();
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();

        let formatter = DefaultGiveawayFormatter::new();
        let output = formatter.announcement(&giveaway, now);

        assert_eq!(output.contains("**Giveaway: Steam key**"), true);
        assert_eq!(output.contains("Winners: 2"), true);
        assert_eq!(output.contains("Only members with <@&55> can join"), true);
        assert_eq!(output.contains("Time left: 2h 5m"), true);
        assert_eq!(output.contains(&giveaway.id().to_string()), true);
    }

    #[test]
    fn test_resolution_output() {
        let giveaway = get_giveaway();
        let formatter = DefaultGiveawayFormatter::new();

        assert_eq!(
            formatter.resolution(&giveaway, &Resolution::Winners(vec![3, 4])),
            "🏆 The giveaway **Steam key** has ended! Congratulations <@3>, <@4>!"
        );
        assert_eq!(
            formatter.resolution(&giveaway, &Resolution::Winners(vec![3])),
            "🏆 The giveaway **Steam key** has ended! Not enough participants, so everyone \
             who joined wins: <@3>!"
        );
        assert_eq!(
            formatter.resolution(&giveaway, &Resolution::NoParticipants),
            "😢 The giveaway **Steam key** has ended without participants."
        );
    }

    #[test]
    fn test_countdown_output() {
        let giveaway = get_giveaway();
        let formatter = DefaultGiveawayFormatter::new();

        assert_eq!(
            formatter.countdown(&giveaway, 3),
            "⏱️ The giveaway **Steam key** ends in 3 seconds!"
        );
    }
}
