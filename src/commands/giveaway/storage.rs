use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;

use crate::commands::giveaway::models::{Giveaway, GiveawayId};
use crate::commands::giveaway::notifier::MessageHandle;
use crate::error::{Error, ErrorKind, Result};
use crate::storage::{ArchivedGiveaway, PersistedState};

// A single giveaway record. Every mutation goes through the mutex, so that
// joins, leaves and the resolution never interleave.
#[derive(Debug)]
pub struct GiveawayEntry {
    giveaway: Mutex<Giveaway>,
    // Signals the scheduled task of this giveaway to stop.
    cancel: watch::Sender<bool>,
}

impl GiveawayEntry {
    pub fn new(giveaway: Giveaway) -> Self {
        let (cancel, _) = watch::channel(false);
        GiveawayEntry {
            giveaway: Mutex::new(giveaway),
            cancel,
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Giveaway>> {
        Ok(self.giveaway.lock()?)
    }

    // Returns a copy of the current state.
    pub fn snapshot(&self) -> Result<Giveaway> {
        Ok(self.lock()?.clone())
    }

    pub fn subscribe_cancel(&self) -> watch::Receiver<bool> {
        self.cancel.subscribe()
    }

    pub fn cancel_schedule(&self) {
        self.cancel.send_replace(true);
    }
}

#[derive(Debug)]
struct ArchivedEntry {
    entry: Arc<GiveawayEntry>,
    archived_at: DateTime<Utc>,
}

/// Running giveaways and the recently finished ones.
///
/// Finished giveaways stay in the history for the retention window, so that
/// they can be rerolled or inspected, and are evicted afterwards.
#[derive(Debug)]
#[non_exhaustive]
pub struct GiveawayStore {
    active: DashMap<GiveawayId, Arc<GiveawayEntry>>,
    history: DashMap<GiveawayId, ArchivedEntry>,
    messages: DashMap<MessageHandle, GiveawayId>,
    retention: Duration,
}

impl GiveawayStore {
    pub fn new(retention: Duration) -> Self {
        GiveawayStore {
            active: DashMap::new(),
            history: DashMap::new(),
            messages: DashMap::new(),
            retention,
        }
    }

    pub fn insert(&self, entry: Arc<GiveawayEntry>) -> Result<()> {
        let giveaway = entry.snapshot()?;
        if let Some(message) = giveaway.message() {
            self.messages.insert(message, giveaway.id());
        }
        self.active.insert(giveaway.id(), entry);
        Ok(())
    }

    pub fn insert_archived(&self, entry: Arc<GiveawayEntry>, archived_at: DateTime<Utc>) -> Result<()> {
        let giveaway = entry.snapshot()?;
        if let Some(message) = giveaway.message() {
            self.messages.insert(message, giveaway.id());
        }
        self.history.insert(giveaway.id(), ArchivedEntry { entry, archived_at });
        Ok(())
    }

    // Returns a giveaway which is still running.
    pub fn get_active(&self, id: GiveawayId) -> Result<Arc<GiveawayEntry>> {
        match self.active.get(&id) {
            Some(entry) => Ok(entry.value().clone()),
            None => Err(not_found(id)),
        }
    }

    // Returns a running or an archived giveaway.
    pub fn get(&self, id: GiveawayId) -> Result<Arc<GiveawayEntry>> {
        if let Some(entry) = self.active.get(&id) {
            return Ok(entry.value().clone());
        }

        match self.history.get(&id) {
            Some(archived) => Ok(archived.value().entry.clone()),
            None => Err(not_found(id)),
        }
    }

    pub fn link_message(&self, message: MessageHandle, id: GiveawayId) {
        self.messages.insert(message, id);
    }

    pub fn find_by_message(&self, message: MessageHandle) -> Option<GiveawayId> {
        self.messages.get(&message).map(|id| *id.value())
    }

    // Moves the giveaway from the running ones into the history.
    pub fn archive(&self, id: GiveawayId, now: DateTime<Utc>) {
        let Some(entry) = self.active.get(&id).map(|entry| entry.value().clone()) else {
            return;
        };

        // Inserted before the removal, so that lookups always find the record.
        self.history.insert(
            id,
            ArchivedEntry {
                entry,
                archived_at: now,
            },
        );
        self.active.remove(&id);
    }

    // Drops the giveaway completely (e.g. after cancellation).
    pub fn remove(&self, id: GiveawayId) {
        self.active.remove(&id);
        self.history.remove(&id);
        self.messages.retain(|_, giveaway_id| *giveaway_id != id);
    }

    // Removes archived giveaways older than the retention window. Returns the
    // number of evicted records.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let expired = self
            .history
            .iter()
            .filter(|archived| {
                (now - archived.value().archived_at)
                    .to_std()
                    .map(|age| age >= self.retention)
                    .unwrap_or(false)
            })
            .map(|archived| *archived.key())
            .collect::<Vec<GiveawayId>>();

        for id in expired.iter() {
            self.history.remove(id);
        }
        if !expired.is_empty() {
            self.messages.retain(|_, giveaway_id| !expired.contains(giveaway_id));
        }

        expired.len()
    }

    pub fn active_entries(&self) -> Vec<Arc<GiveawayEntry>> {
        self.active
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // Collects the state of every known giveaway for the persistence.
    pub fn persisted_state(&self) -> Result<PersistedState> {
        let active = self
            .active_entries()
            .iter()
            .map(|entry| entry.snapshot())
            .collect::<Result<Vec<Giveaway>>>()?;

        let history = self
            .history
            .iter()
            .map(|archived| {
                Ok(ArchivedGiveaway {
                    giveaway: archived.value().entry.snapshot()?,
                    archived_at: archived.value().archived_at,
                })
            })
            .collect::<Result<Vec<ArchivedGiveaway>>>()?;

        Ok(PersistedState { active, history })
    }
}

pub fn not_found(id: GiveawayId) -> Error {
    let message = format!("The giveaway `{}` was not found.", id);
    Error::from(ErrorKind::NotFound(message))
}
