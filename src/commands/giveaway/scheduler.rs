// Drives every running giveaway through its milestones. Each giveaway gets
// its own task, so a long giveaway never delays the others.
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, warn};

use crate::commands::giveaway::manager::GiveawayManager;
use crate::commands::giveaway::models::GiveawayId;
use crate::error::ErrorKind;

// Wall clock tied to the tokio timer, so that sleeping and reading the time
// always agree with each other.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
    origin_time: DateTime<Utc>,
}

impl Clock {
    pub fn new() -> Self {
        Clock {
            origin: Instant::now(),
            origin_time: Utc::now(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = Instant::now().duration_since(self.origin);
        self.origin_time + TimeDelta::from_std(elapsed).unwrap_or_else(|_| TimeDelta::zero())
    }
}

// What the scheduled task must do after a check.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Tick {
    // Sleep and check again.
    Wait(Duration),
    // Run the final countdown from the given number of seconds, then resolve.
    Countdown(u64),
    // The end time has been reached.
    Due,
    // The giveaway isn't running anymore.
    Closed,
}

pub fn spawn(
    manager: Arc<GiveawayManager>,
    id: GiveawayId,
    cancelled: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move { run(manager, id, cancelled).await })
}

fn is_cancelled(cancelled: &watch::Receiver<bool>) -> bool {
    // An error means that the giveaway record was dropped.
    *cancelled.borrow() || cancelled.has_changed().is_err()
}

// Completes once the schedule is cancelled or the giveaway record is dropped.
async fn cancellation(cancelled: &mut watch::Receiver<bool>) {
    let _ = cancelled.wait_for(|flag| *flag).await;
}

async fn run(manager: Arc<GiveawayManager>, id: GiveawayId, mut cancelled: watch::Receiver<bool>) {
    debug!(giveaway = %id, "The giveaway schedule has started");

    loop {
        if is_cancelled(&cancelled) {
            break;
        }

        let tick = match manager.tick(id).await {
            Ok(tick) => tick,
            Err(err) => {
                warn!(giveaway = %id, "Stopping the giveaway schedule: {}", err);
                break;
            }
        };

        match tick {
            Tick::Wait(duration) => {
                tokio::select! {
                    _ = sleep(duration) => {},
                    _ = cancellation(&mut cancelled) => break,
                }
            }
            Tick::Countdown(seconds) => {
                if countdown(&manager, id, seconds, &mut cancelled).await {
                    resolve(&manager, id).await;
                }
                break;
            }
            Tick::Due => {
                resolve(&manager, id).await;
                break;
            }
            Tick::Closed => break,
        }
    }

    debug!(giveaway = %id, "The giveaway schedule has finished");
}

// Shows a descending per-second countdown in a single message and removes
// the message afterwards. Returns false when interrupted by a cancellation.
async fn countdown(
    manager: &GiveawayManager,
    id: GiveawayId,
    seconds: u64,
    cancelled: &mut watch::Receiver<bool>,
) -> bool {
    let giveaway = match manager.giveaway(id) {
        Ok(giveaway) => giveaway,
        Err(err) => {
            warn!(giveaway = %id, "Can't start the countdown: {}", err);
            return false;
        }
    };

    let mut message = None;
    let mut completed = true;
    for seconds_left in (1..=seconds).rev() {
        if is_cancelled(cancelled) {
            completed = false;
            break;
        }

        message = manager.show_countdown(&giveaway, seconds_left, message).await;

        tokio::select! {
            _ = sleep(Duration::from_secs(1)) => {},
            _ = cancellation(cancelled) => {
                completed = false;
                break;
            }
        }
    }

    if let Some(message) = message {
        manager.clear_countdown(message).await;
    }

    completed
}

async fn resolve(manager: &GiveawayManager, id: GiveawayId) {
    match manager.resolve(id).await {
        Ok(_) => {}
        Err(err) => match err.kind() {
            ErrorKind::AlreadyEnded(_) | ErrorKind::NotFound(_) => {
                debug!(giveaway = %id, "The giveaway was resolved elsewhere: {}", err)
            }
            _ => error!(giveaway = %id, "Can't resolve the giveaway: {}", err),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeDelta;

    use crate::commands::giveaway::scheduler::Clock;

    #[tokio::test(start_paused = true)]
    async fn test_clock_follows_the_tokio_timer() {
        let clock = Clock::new();
        let started_at = clock.now();

        tokio::time::sleep(Duration::from_secs(90)).await;

        assert_eq!(clock.now() - started_at, TimeDelta::seconds(90));
    }
}
