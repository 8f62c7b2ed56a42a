use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::commands::giveaway::formatters::{
    ANNOUNCEMENT_REACTION, DefaultGiveawayFormatter, GiveawayFormatter,
};
use crate::commands::giveaway::models::{
    EntrantId, Giveaway, GiveawayId, GiveawayRequest, JoinResult, LeaveResult, Resolution,
    RoleId, UserId,
};
use crate::commands::giveaway::notifier::{MessageHandle, Notifier};
use crate::commands::giveaway::persistence::SnapshotWriter;
use crate::commands::giveaway::scheduler::{self, Clock, Tick};
use crate::commands::giveaway::storage::{GiveawayEntry, GiveawayStore, not_found};
use crate::commands::giveaway::strategies::{DrawOptions, RandomSampleStrategy, WinnerStrategy};
use crate::commands::giveaway::utils;
use crate::config::EngineConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::storage::SnapshotStorage;

/// Owns every giveaway of the bot and performs all operations on them.
///
/// Each running giveaway is driven by its own scheduled task. Requests and
/// the scheduled tasks only meet on the giveaway record itself, so a join
/// never waits for a timer and two giveaways never wait for each other.
#[non_exhaustive]
pub struct GiveawayManager {
    store: Arc<GiveawayStore>,
    config: EngineConfig,
    clock: Clock,
    notifier: Option<Arc<dyn Notifier>>,
    strategy: Arc<dyn WinnerStrategy>,
    formatter: Arc<dyn GiveawayFormatter>,
    storage: Option<Arc<dyn SnapshotStorage>>,
    writer: Option<SnapshotWriter>,
}

impl GiveawayManager {
    pub fn new(config: EngineConfig) -> Self {
        GiveawayManager {
            store: Arc::new(GiveawayStore::new(config.retention)),
            config,
            clock: Clock::new(),
            notifier: None,
            strategy: Arc::new(RandomSampleStrategy::new()),
            formatter: Arc::new(DefaultGiveawayFormatter::new()),
            storage: None,
            writer: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Saves the giveaways into the given storage after every change. Starts
    /// the writer task, so it must be called within a tokio runtime.
    pub fn with_storage(mut self, storage: Arc<dyn SnapshotStorage>) -> Self {
        self.writer = Some(SnapshotWriter::spawn(self.store.clone(), storage.clone()));
        self.storage = Some(storage);
        self
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn WinnerStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn GiveawayFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[cfg(test)]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn notifier(&self) -> Option<&Arc<dyn Notifier>> {
        self.notifier.as_ref()
    }

    pub async fn create(self: &Arc<Self>, request: GiveawayRequest) -> Result<Giveaway> {
        let now = self.now();
        request.validate(now)?;

        let giveaway = Giveaway::new(request, now);
        let id = giveaway.id();
        let entry = Arc::new(GiveawayEntry::new(giveaway.clone()));
        self.store.insert(entry.clone())?;
        info!(
            giveaway = %id,
            host = giveaway.host_id(),
            winners = giveaway.winner_count(),
            end_time = %giveaway.end_time(),
            "The giveaway has been created"
        );

        let content = self.formatter.announcement(&giveaway, now);
        let announcement = utils::post_message(self.notifier(), giveaway.channel_id(), &content).await;
        if let Some(message) = announcement {
            entry.lock()?.set_message(Some(message));
            self.store.link_message(message, id);
            utils::add_reaction(self.notifier(), message, ANNOUNCEMENT_REACTION).await;
        }

        self.checkpoint();
        scheduler::spawn(self.clone(), id, entry.subscribe_cancel());
        entry.snapshot()
    }

    pub fn join(&self, id: GiveawayId, entrant_id: EntrantId, entrant_roles: &[RoleId]) -> Result<JoinResult> {
        let entry = self.store.get_active(id)?;

        let result = {
            let mut giveaway = entry.lock()?;
            if !giveaway.is_open() {
                return Err(not_found(id));
            }

            if !giveaway.is_eligible(entrant_roles) {
                let message = format!(
                    "Only members with the <@&{}> role can join this giveaway.",
                    giveaway.role_filter().unwrap_or_default()
                );
                return Err(Error::from(ErrorKind::RoleNotEligible(message)));
            }

            match giveaway.add_participant(entrant_id) {
                true => JoinResult::Joined,
                false => JoinResult::AlreadyJoined,
            }
        };

        if result == JoinResult::Joined {
            debug!(giveaway = %id, entrant = entrant_id, "A new participant has joined the giveaway");
            self.checkpoint();
        }
        Ok(result)
    }

    pub fn leave(&self, id: GiveawayId, entrant_id: EntrantId) -> Result<LeaveResult> {
        let entry = self.store.get_active(id)?;

        let result = {
            let mut giveaway = entry.lock()?;
            if !giveaway.is_open() {
                return Err(not_found(id));
            }

            match giveaway.remove_participant(entrant_id) {
                true => LeaveResult::Left,
                false => LeaveResult::NotParticipant,
            }
        };

        if result == LeaveResult::Left {
            debug!(giveaway = %id, entrant = entrant_id, "A participant has left the giveaway");
            self.checkpoint();
        }
        Ok(result)
    }

    // Resolves the giveaway right away instead of waiting for its end time.
    pub async fn end_now(&self, id: GiveawayId, requester_id: UserId, is_administrator: bool) -> Result<Resolution> {
        let entry = self.store.get(id)?;
        check_manager(&entry, requester_id, is_administrator)?;

        info!(giveaway = %id, requester = requester_id, "Ending the giveaway ahead of time");
        self.resolve_entry(&entry).await
    }

    pub(crate) async fn resolve(&self, id: GiveawayId) -> Result<Resolution> {
        let entry = self.store.get(id)?;
        self.resolve_entry(&entry).await
    }

    async fn resolve_entry(&self, entry: &GiveawayEntry) -> Result<Resolution> {
        let now = self.now();

        // Whoever sees the giveaway open first draws the winners, every
        // later caller gets AlreadyEnded.
        let (giveaway, resolution) = {
            let mut giveaway = entry.lock()?;
            if !giveaway.is_open() {
                return Err(already_ended(giveaway.id()));
            }

            let resolution = match giveaway.participants().is_empty() {
                true => Resolution::NoParticipants,
                false => Resolution::Winners(self.draw(giveaway.participants(), giveaway.winner_count())),
            };
            giveaway.finish(resolution.winners().iter().copied().collect());
            (giveaway.clone(), resolution)
        };

        entry.cancel_schedule();
        self.store.archive(giveaway.id(), now);
        let evicted = self.store.evict_expired(now);
        if evicted > 0 {
            debug!(evicted = evicted, "Dropped the expired giveaways from the history");
        }
        self.checkpoint();

        info!(
            giveaway = %giveaway.id(),
            participants = giveaway.participants().len(),
            winners = resolution.winners().len(),
            "The giveaway has ended"
        );

        if let Some(message) = giveaway.message() {
            let summary = self.formatter.summary(&giveaway, &resolution);
            utils::edit_message(self.notifier(), message, &summary).await;
        }
        let content = self.formatter.resolution(&giveaway, &resolution);
        utils::post_message(self.notifier(), giveaway.channel_id(), &content).await;

        Ok(resolution)
    }

    pub async fn reroll(
        &self,
        id: GiveawayId,
        requester_id: UserId,
        is_administrator: bool,
        winner_count: Option<usize>,
    ) -> Result<Vec<EntrantId>> {
        let entry = self.store.get(id)?;

        let (giveaway, winners) = {
            let mut giveaway = entry.lock()?;
            if giveaway.is_open() || giveaway.is_cancelled() {
                let message = format!("The giveaway `{}` hasn't been resolved yet.", id);
                return Err(Error::from(ErrorKind::NotFound(message)));
            }

            if !giveaway.is_managed_by(requester_id, is_administrator) {
                return Err(unauthorized());
            }

            if winner_count == Some(0) {
                let message = "The giveaway must have at least one winner.".to_string();
                return Err(Error::from(ErrorKind::InvalidArgument(message)));
            }

            if giveaway.participants().is_empty() {
                let message = format!("Nobody has joined the giveaway `{}`, there is nobody to reroll.", id);
                return Err(Error::from(ErrorKind::NoParticipants(message)));
            }

            let winner_count = winner_count.unwrap_or(giveaway.winner_count());
            let winners = self.draw(giveaway.participants(), winner_count);
            giveaway.set_winners(winners.iter().copied().collect());
            (giveaway.clone(), winners)
        };

        info!(giveaway = %id, requester = requester_id, winners = winners.len(), "The giveaway has been rerolled");
        self.checkpoint();

        let content = self.formatter.reroll(&giveaway, &winners);
        utils::post_message(self.notifier(), giveaway.channel_id(), &content).await;
        Ok(winners)
    }

    pub fn list_participants(
        &self,
        id: GiveawayId,
        requester_id: UserId,
        is_administrator: bool,
    ) -> Result<HashSet<EntrantId>> {
        let entry = self.store.get(id)?;
        let giveaway = entry.lock()?;

        if !giveaway.is_managed_by(requester_id, is_administrator) {
            return Err(unauthorized());
        }

        Ok(giveaway.participants().clone())
    }

    // Stops the giveaway without drawing any winners.
    pub async fn cancel(&self, id: GiveawayId, requester_id: UserId, is_administrator: bool) -> Result<()> {
        let entry = self.store.get(id)?;

        let giveaway = {
            let mut giveaway = entry.lock()?;
            if !giveaway.is_managed_by(requester_id, is_administrator) {
                return Err(unauthorized());
            }

            if !giveaway.is_open() {
                return Err(already_ended(id));
            }

            giveaway.cancel();
            giveaway.clone()
        };

        entry.cancel_schedule();
        self.store.remove(id);
        self.checkpoint();
        info!(giveaway = %id, requester = requester_id, "The giveaway has been cancelled");

        if let Some(message) = giveaway.message() {
            let content = self.formatter.cancelled(&giveaway);
            utils::edit_message(self.notifier(), message, &content).await;
        }
        Ok(())
    }

    pub fn find_by_message(&self, message: MessageHandle) -> Option<GiveawayId> {
        self.store.find_by_message(message)
    }

    // Returns the running giveaways, the closest to the end go first.
    pub fn active(&self) -> Vec<Giveaway> {
        let mut giveaways = self
            .store
            .active_entries()
            .iter()
            .filter_map(|entry| entry.snapshot().ok())
            .filter(|giveaway| giveaway.is_open())
            .collect::<Vec<Giveaway>>();
        giveaways.sort_by_key(|giveaway| giveaway.end_time());
        giveaways
    }

    pub fn giveaway(&self, id: GiveawayId) -> Result<Giveaway> {
        self.store.get(id)?.snapshot()
    }

    // Checks the giveaway and tells the scheduled task what to do next. The
    // one-time notifications are flagged under the lock, so every one of them
    // is sent at most once.
    pub(crate) async fn tick(&self, id: GiveawayId) -> Result<Tick> {
        let entry = self.store.get(id)?;
        let now = self.now();

        let (giveaway, send_warning, tick) = {
            let mut giveaway = entry.lock()?;
            if !giveaway.is_open() {
                return Ok(Tick::Closed);
            }

            let Some(remaining) = giveaway.remaining(now) else {
                return Ok(Tick::Due);
            };

            let warning_threshold = self.config.warning_threshold;
            let countdown_window = self.config.countdown_window();
            let send_warning = remaining <= warning_threshold && giveaway.mark_one_minute_notified();
            let tick = if remaining <= countdown_window {
                match giveaway.mark_countdown_notified() {
                    true => Tick::Countdown(countdown_from(remaining, self.config.countdown_seconds)),
                    // Already shown before a restart, only the end is left.
                    false => Tick::Wait(remaining),
                }
            } else if remaining <= warning_threshold {
                Tick::Wait(remaining - countdown_window)
            } else {
                Tick::Wait(
                    self.config
                        .status_refresh_interval
                        .min(remaining - warning_threshold),
                )
            };
            (giveaway.clone(), send_warning, tick)
        };

        if send_warning || matches!(tick, Tick::Countdown(_)) {
            self.checkpoint();
        }

        if send_warning {
            let content = self.formatter.one_minute_warning(&giveaway);
            utils::post_message(self.notifier(), giveaway.channel_id(), &content).await;
        }

        if let (Tick::Wait(_), Some(message)) = (tick, giveaway.message()) {
            let content = self.formatter.announcement(&giveaway, now);
            utils::edit_message(self.notifier(), message, &content).await;
        }

        Ok(tick)
    }

    pub(crate) async fn show_countdown(
        &self,
        giveaway: &Giveaway,
        seconds_left: u64,
        message: Option<MessageHandle>,
    ) -> Option<MessageHandle> {
        let content = self.formatter.countdown(giveaway, seconds_left);
        utils::update_or_post_message(self.notifier(), giveaway.channel_id(), message, &content).await
    }

    pub(crate) async fn clear_countdown(&self, message: MessageHandle) {
        utils::delete_message(self.notifier(), message).await;
    }

    // Asks the writer to save every known giveaway. Failures are only
    // logged, the giveaways keep running in memory.
    pub fn checkpoint(&self) {
        if let Some(writer) = self.writer.as_ref() {
            writer.request();
        }
    }

    // Returns once everything changed so far has been saved.
    pub async fn flush(&self) {
        if let Some(writer) = self.writer.as_ref() {
            writer.flush().await;
        }
    }

    /// Loads the saved giveaways and restarts the schedules of the running
    /// ones. Giveaways that were due while the bot was offline are resolved
    /// right away. Returns the number of restored giveaways.
    ///
    /// A state that can't be loaded is moved aside and the manager starts
    /// without any giveaways.
    pub async fn restore(self: &Arc<Self>) -> Result<usize> {
        let Some(storage) = self.storage.as_ref() else {
            return Ok(0);
        };

        let state = match storage.load().await {
            Ok(Some(state)) => state,
            Ok(None) => return Ok(0),
            Err(err) => {
                error!("Can't load the saved giveaways, starting without them: {}", err);
                if let Err(err) = storage.set_aside().await {
                    error!("Can't move the unreadable giveaways state aside: {}", err);
                }
                return Ok(0);
            }
        };

        let now = self.now();
        let mut restored = 0;
        for archived in state.history {
            if self.store.get(archived.giveaway.id()).is_ok() {
                continue;
            }

            let entry = Arc::new(GiveawayEntry::new(archived.giveaway));
            self.store.insert_archived(entry, archived.archived_at)?;
            restored += 1;
        }

        for giveaway in state.active {
            let id = giveaway.id();
            if self.store.get(id).is_ok() {
                continue;
            }

            if !giveaway.is_open() {
                let entry = Arc::new(GiveawayEntry::new(giveaway));
                self.store.insert_archived(entry, now)?;
                restored += 1;
                continue;
            }

            let entry = Arc::new(GiveawayEntry::new(giveaway));
            self.store.insert(entry.clone())?;
            scheduler::spawn(self.clone(), id, entry.subscribe_cancel());
            restored += 1;
        }

        let evicted = self.store.evict_expired(now);
        info!(
            restored = restored,
            evicted = evicted,
            running = self.store.active_len(),
            "The saved giveaways have been restored"
        );
        Ok(restored)
    }

    // Stops every schedule and leaves the unfinished giveaways open, so that
    // they can be restored on the next start.
    pub async fn shutdown(&self) {
        let entries = self.store.active_entries();
        for entry in entries.iter() {
            entry.cancel_schedule();
        }

        self.checkpoint();
        self.flush().await;
        if !entries.is_empty() {
            warn!(running = entries.len(), "Stopped the schedules of the running giveaways");
        }
    }

    fn draw(&self, participants: &HashSet<EntrantId>, winner_count: usize) -> Vec<EntrantId> {
        let options = DrawOptions::new(participants, winner_count);
        let mut winners = self.strategy.draw(&options);
        winners.sort_unstable();
        winners
    }
}

fn countdown_from(remaining: std::time::Duration, countdown_seconds: u64) -> u64 {
    let seconds = remaining.as_millis().div_ceil(1000) as u64;
    seconds.clamp(1, countdown_seconds.max(1))
}

fn check_manager(entry: &GiveawayEntry, requester_id: UserId, is_administrator: bool) -> Result<()> {
    let giveaway = entry.lock()?;
    match giveaway.is_managed_by(requester_id, is_administrator) {
        true => Ok(()),
        false => Err(unauthorized()),
    }
}

fn unauthorized() -> Error {
    let message = "Only the host of the giveaway or an administrator can do this.".to_string();
    Error::from(ErrorKind::Unauthorized(message))
}

fn already_ended(id: GiveawayId) -> Error {
    let message = format!("The giveaway `{}` has already ended.", id);
    Error::from(ErrorKind::AlreadyEnded(message))
}
