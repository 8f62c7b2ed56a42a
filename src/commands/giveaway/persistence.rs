use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error};

use crate::commands::giveaway::storage::GiveawayStore;
use crate::storage::SnapshotStorage;

// Writes the giveaways to the snapshot storage from a single task.
//
// Callers only bump the requested version. The writer takes the snapshot
// right before each save, so a save never carries older state than the one
// before it, and several requests made during a slow save collapse into one.
#[derive(Debug)]
pub struct SnapshotWriter {
    requested: watch::Sender<u64>,
    saved: watch::Receiver<u64>,
}

impl SnapshotWriter {
    /// Starts the writer task. Must be called within a tokio runtime.
    pub fn spawn(store: Arc<GiveawayStore>, storage: Arc<dyn SnapshotStorage>) -> Self {
        let (requested, requests) = watch::channel(0);
        let (saved_sender, saved) = watch::channel(0);
        tokio::spawn(run(store, storage, requests, saved_sender));
        SnapshotWriter { requested, saved }
    }

    pub fn request(&self) {
        self.requested.send_modify(|version| *version += 1);
    }

    /// Waits until every request made so far has been written.
    pub async fn flush(&self) {
        let target = *self.requested.borrow();
        let mut saved = self.saved.clone();
        if saved.wait_for(|version| *version >= target).await.is_err() {
            error!("The giveaways writer has stopped before the last save");
        }
    }
}

async fn run(
    store: Arc<GiveawayStore>,
    storage: Arc<dyn SnapshotStorage>,
    mut requests: watch::Receiver<u64>,
    saved: watch::Sender<u64>,
) {
    while requests.changed().await.is_ok() {
        let version = *requests.borrow_and_update();

        // A failed save is reported as done anyway. The next request writes
        // the whole state again.
        let result = match store.persisted_state() {
            Ok(state) => storage.save(&state).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => debug!(version = version, "The giveaways have been saved"),
            Err(err) => error!("Can't save the giveaways: {}", err),
        }
        saved.send_replace(version);
    }
}
