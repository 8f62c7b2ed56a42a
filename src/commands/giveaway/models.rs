use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commands::giveaway::notifier::MessageHandle;
use crate::error::{Error, ErrorKind, Result};

pub type EntrantId = u64;
pub type UserId = u64;
pub type RoleId = u64;
pub type ChannelId = u64;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GiveawayId(Uuid);

impl GiveawayId {
    pub fn new() -> Self {
        GiveawayId(Uuid::new_v4())
    }
}

impl fmt::Display for GiveawayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for GiveawayId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match Uuid::parse_str(value.trim()) {
            Ok(uuid) => Ok(GiveawayId(uuid)),
            Err(_) => {
                let message = format!("`{}` is not a valid giveaway id.", value.trim());
                Err(Error::from(ErrorKind::InvalidArgument(message)))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum GiveawayStatus {
    Open,
    Ended,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum JoinResult {
    Joined,
    AlreadyJoined,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LeaveResult {
    Left,
    NotParticipant,
}

// Outcome of drawing the winners. Winners are sorted by id.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Resolution {
    Winners(Vec<EntrantId>),
    NoParticipants,
}

impl Resolution {
    pub fn winners(&self) -> &[EntrantId] {
        match self {
            Resolution::Winners(winners) => winners,
            Resolution::NoParticipants => &[],
        }
    }
}

// Parameters of a giveaway that is about to be started.
#[derive(Debug, Clone)]
pub struct GiveawayRequest {
    host_id: UserId,
    channel_id: ChannelId,
    prize: String,
    winner_count: usize,
    end_time: DateTime<Utc>,
    role_filter: Option<RoleId>,
}

impl GiveawayRequest {
    pub fn new(host_id: UserId, channel_id: ChannelId, prize: &str, end_time: DateTime<Utc>) -> Self {
        GiveawayRequest {
            host_id,
            channel_id,
            prize: prize.trim().to_string(),
            winner_count: 1,
            end_time,
            role_filter: None,
        }
    }

    pub fn with_winner_count(mut self, winner_count: usize) -> Self {
        self.winner_count = winner_count;
        self
    }

    pub fn with_role_filter(mut self, role_filter: Option<RoleId>) -> Self {
        self.role_filter = role_filter;
        self
    }

    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if self.prize.is_empty() {
            let message = "The giveaway prize can't be empty.".to_string();
            return Err(Error::from(ErrorKind::InvalidArgument(message)));
        }

        if self.winner_count < 1 {
            let message = "The giveaway must have at least one winner.".to_string();
            return Err(Error::from(ErrorKind::InvalidArgument(message)));
        }

        if self.end_time <= now {
            let message = "The giveaway must end in the future.".to_string();
            return Err(Error::from(ErrorKind::InvalidArgument(message)));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Giveaway {
    id: GiveawayId,
    // Who started the giveaway. Allowed to end, reroll and inspect it.
    host_id: UserId,
    // Where every notification about the giveaway is posted.
    channel_id: ChannelId,
    prize: String,
    winner_count: usize,
    created_at: DateTime<Utc>,
    // Fixed at creation, never moved.
    end_time: DateTime<Utc>,
    // Only members with this role are allowed to join.
    role_filter: Option<RoleId>,
    participants: HashSet<EntrantId>,
    status: GiveawayStatus,
    notified_one_minute: bool,
    notified_countdown: bool,
    winners: HashSet<EntrantId>,
    // The announcement message, refreshed while the giveaway is running.
    message: Option<MessageHandle>,
    #[serde(default)]
    cancelled: bool,
}

impl Giveaway {
    pub fn new(request: GiveawayRequest, now: DateTime<Utc>) -> Self {
        Giveaway {
            id: GiveawayId::new(),
            host_id: request.host_id,
            channel_id: request.channel_id,
            prize: request.prize,
            winner_count: request.winner_count,
            created_at: now,
            end_time: request.end_time,
            role_filter: request.role_filter,
            participants: HashSet::new(),
            status: GiveawayStatus::Open,
            notified_one_minute: false,
            notified_countdown: false,
            winners: HashSet::new(),
            message: None,
            cancelled: false,
        }
    }

    pub fn id(&self) -> GiveawayId {
        self.id
    }

    pub fn host_id(&self) -> UserId {
        self.host_id
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn prize(&self) -> &str {
        &self.prize
    }

    pub fn winner_count(&self) -> usize {
        self.winner_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn role_filter(&self) -> Option<RoleId> {
        self.role_filter
    }

    pub fn participants(&self) -> &HashSet<EntrantId> {
        &self.participants
    }

    pub fn status(&self) -> GiveawayStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == GiveawayStatus::Open
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn winners(&self) -> &HashSet<EntrantId> {
        &self.winners
    }

    pub fn message(&self) -> Option<MessageHandle> {
        self.message
    }

    pub fn set_message(&mut self, message: Option<MessageHandle>) {
        self.message = message;
    }

    pub fn is_notified_one_minute(&self) -> bool {
        self.notified_one_minute
    }

    pub fn is_notified_countdown(&self) -> bool {
        self.notified_countdown
    }

    // Host and administrators are allowed to manage the giveaway.
    pub fn is_managed_by(&self, requester_id: UserId, is_administrator: bool) -> bool {
        is_administrator || self.host_id == requester_id
    }

    // Checks the role filter against the roles of the entrant.
    pub fn is_eligible(&self, entrant_roles: &[RoleId]) -> bool {
        match self.role_filter {
            Some(role) => entrant_roles.contains(&role),
            None => true,
        }
    }

    // Returns true when the entrant was not participating before.
    pub fn add_participant(&mut self, entrant_id: EntrantId) -> bool {
        self.participants.insert(entrant_id)
    }

    // Returns true when the entrant was participating before.
    pub fn remove_participant(&mut self, entrant_id: EntrantId) -> bool {
        self.participants.remove(&entrant_id)
    }

    // Time left until the end. None once the end time has been reached.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.end_time - now)
            .to_std()
            .ok()
            .filter(|remaining| !remaining.is_zero())
    }

    // Flips the one-minute flag. Returns true only on the first call.
    pub fn mark_one_minute_notified(&mut self) -> bool {
        !std::mem::replace(&mut self.notified_one_minute, true)
    }

    // Flips the countdown flag. Returns true only on the first call.
    pub fn mark_countdown_notified(&mut self) -> bool {
        !std::mem::replace(&mut self.notified_countdown, true)
    }

    pub fn finish(&mut self, winners: HashSet<EntrantId>) {
        self.status = GiveawayStatus::Ended;
        self.winners = winners;
    }

    pub fn cancel(&mut self) {
        self.status = GiveawayStatus::Ended;
        self.cancelled = true;
        self.winners.clear();
    }

    pub fn set_winners(&mut self, winners: HashSet<EntrantId>) {
        self.winners = winners;
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use crate::commands::giveaway::models::{
        Giveaway, GiveawayId, GiveawayRequest, GiveawayStatus,
    };
    use crate::error::{Error, ErrorKind};

    fn get_request() -> GiveawayRequest {
        let end_time = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        GiveawayRequest::new(1, 100, "Steam key", end_time)
    }

    #[test]
    fn test_validate_request() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 11, 0, 0).unwrap();

        assert_eq!(get_request().validate(now), Ok(()));
    }

    #[test]
    fn test_get_error_for_zero_winners() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 11, 0, 0).unwrap();
        let request = get_request().with_winner_count(0);

        assert_eq!(
            request.validate(now),
            Err(Error::from(ErrorKind::InvalidArgument(
                "The giveaway must have at least one winner.".to_string()
            )))
        );
    }

    #[test]
    fn test_get_error_for_end_time_in_the_past() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();

        assert_eq!(
            get_request().validate(now),
            Err(Error::from(ErrorKind::InvalidArgument(
                "The giveaway must end in the future.".to_string()
            )))
        );
    }

    #[test]
    fn test_get_error_for_blank_prize() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 11, 0, 0).unwrap();
        let end_time = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let request = GiveawayRequest::new(1, 100, "   ", end_time);

        assert_eq!(
            request.validate(now),
            Err(Error::from(ErrorKind::InvalidArgument(
                "The giveaway prize can't be empty.".to_string()
            )))
        );
    }

    #[test]
    fn test_new_giveaway_is_open_and_empty() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 11, 0, 0).unwrap();
        let giveaway = Giveaway::new(get_request().with_winner_count(3), now);

        assert_eq!(giveaway.status(), GiveawayStatus::Open);
        assert_eq!(giveaway.winner_count(), 3);
        assert_eq!(giveaway.participants().is_empty(), true);
        assert_eq!(giveaway.winners().is_empty(), true);
        assert_eq!(giveaway.is_notified_one_minute(), false);
        assert_eq!(giveaway.is_notified_countdown(), false);
    }

    #[test]
    fn test_participants_are_a_set() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 11, 0, 0).unwrap();
        let mut giveaway = Giveaway::new(get_request(), now);

        assert_eq!(giveaway.add_participant(10), true);
        assert_eq!(giveaway.add_participant(10), false);
        assert_eq!(giveaway.participants().len(), 1);

        assert_eq!(giveaway.remove_participant(10), true);
        assert_eq!(giveaway.remove_participant(10), false);
        assert_eq!(giveaway.participants().is_empty(), true);
    }

    #[test]
    fn test_role_filter_eligibility() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 11, 0, 0).unwrap();
        let open_giveaway = Giveaway::new(get_request(), now);
        let restricted_giveaway = Giveaway::new(get_request().with_role_filter(Some(7)), now);

        assert_eq!(open_giveaway.is_eligible(&[]), true);
        assert_eq!(restricted_giveaway.is_eligible(&[1, 2]), false);
        assert_eq!(restricted_giveaway.is_eligible(&[1, 7]), true);
    }

    #[test]
    fn test_notification_flags_flip_once() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 11, 0, 0).unwrap();
        let mut giveaway = Giveaway::new(get_request(), now);

        assert_eq!(giveaway.mark_one_minute_notified(), true);
        assert_eq!(giveaway.mark_one_minute_notified(), false);
        assert_eq!(giveaway.mark_countdown_notified(), true);
        assert_eq!(giveaway.mark_countdown_notified(), false);
    }

    #[test]
    fn test_remaining_time() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 11, 59, 30).unwrap();
        let giveaway = Giveaway::new(get_request(), now);

        assert_eq!(giveaway.remaining(now), Some(Duration::from_secs(30)));
        assert_eq!(giveaway.remaining(giveaway.end_time()), None);
        assert_eq!(
            giveaway.remaining(Utc.with_ymd_and_hms(2030, 1, 1, 13, 0, 0).unwrap()),
            None
        );
    }

    #[test]
    fn test_management_rights() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 11, 0, 0).unwrap();
        let giveaway = Giveaway::new(get_request(), now);

        assert_eq!(giveaway.is_managed_by(1, false), true);
        assert_eq!(giveaway.is_managed_by(2, false), false);
        assert_eq!(giveaway.is_managed_by(2, true), true);
    }

    #[test]
    fn test_parse_giveaway_id() {
        let id = GiveawayId::new();
        let parsed = GiveawayId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);

        let result = GiveawayId::from_str("not-an-id");
        assert_eq!(
            result.unwrap_err(),
            Error::from(ErrorKind::InvalidArgument(
                "`not-an-id` is not a valid giveaway id.".to_string()
            ))
        );
    }
}
