use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::commands::giveaway::models::Giveaway;
use crate::error::Result;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ArchivedGiveaway {
    pub giveaway: Giveaway,
    pub archived_at: DateTime<Utc>,
}

// Everything that needs to survive a restart of the bot.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub active: Vec<Giveaway>,
    pub history: Vec<ArchivedGiveaway>,
}

#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    // Returns None when nothing was saved before.
    async fn load(&self) -> Result<Option<PersistedState>>;
    async fn save(&self, state: &PersistedState) -> Result<()>;

    // Moves a state that can't be loaded out of the way, so that the next
    // save doesn't overwrite it.
    async fn set_aside(&self) -> Result<()> {
        Ok(())
    }
}

// Keeps the giveaways in a single JSON file.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonFileStorage {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_with_suffix(&self, suffix: &str) -> PathBuf {
        let mut file_name = self.path.file_name().unwrap_or_default().to_os_string();
        file_name.push(suffix);
        self.path.with_file_name(file_name)
    }

    fn temporary_path(&self) -> PathBuf {
        self.path_with_suffix(".tmp")
    }

    pub fn corrupt_path(&self) -> PathBuf {
        self.path_with_suffix(".corrupt")
    }
}

#[async_trait]
impl SnapshotStorage for JsonFileStorage {
    async fn load(&self) -> Result<Option<PersistedState>> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No giveaways state found at {}", self.path.display());
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let state = serde_json::from_slice::<PersistedState>(&content)?;
        Ok(Some(state))
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        let content = serde_json::to_vec_pretty(state)?;

        // Written into a temporary file first, so that a crash in the middle
        // never leaves a truncated state behind.
        let _guard = self.write_lock.lock().await;
        let temporary_path = self.temporary_path();
        fs::write(&temporary_path, content).await?;
        fs::rename(&temporary_path, &self.path).await?;
        Ok(())
    }

    async fn set_aside(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let corrupt_path = self.corrupt_path();
        fs::rename(&self.path, &corrupt_path).await?;
        warn!(
            "The giveaways state has been moved from {} to {}",
            self.path.display(),
            corrupt_path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::path::PathBuf;

    use chrono::{TimeZone, Utc};
    use tokio::fs;
    use uuid::Uuid;

    use crate::commands::giveaway::models::{Giveaway, GiveawayRequest};
    use crate::storage::{ArchivedGiveaway, JsonFileStorage, PersistedState, SnapshotStorage};

    fn get_path() -> PathBuf {
        env::temp_dir().join(format!("giveaway-bot-{}.json", Uuid::new_v4()))
    }

    fn get_giveaway(prize: &str) -> Giveaway {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        let end_time = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let request = GiveawayRequest::new(1, 100, prize, end_time).with_role_filter(Some(9));
        let mut giveaway = Giveaway::new(request, now);
        giveaway.add_participant(10);
        giveaway.add_participant(11);
        giveaway
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let storage = JsonFileStorage::new(get_path());

        assert_eq!(storage.load().await, Ok(None));
    }

    #[tokio::test]
    async fn test_save_and_load_state() {
        let path = get_path();
        let storage = JsonFileStorage::new(&path);
        let state = PersistedState {
            active: vec![get_giveaway("first")],
            history: vec![ArchivedGiveaway {
                giveaway: get_giveaway("second"),
                archived_at: Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap(),
            }],
        };

        storage.save(&state).await.unwrap();
        let loaded = storage.load().await.unwrap();
        fs::remove_file(&path).await.unwrap();

        assert_eq!(loaded, Some(state));
    }

    #[tokio::test]
    async fn test_get_error_for_corrupted_file() {
        let path = get_path();
        fs::write(&path, "{ not json").await.unwrap();
        let storage = JsonFileStorage::new(&path);

        let result = storage.load().await;
        fs::remove_file(&path).await.unwrap();

        assert_eq!(result.is_err(), true);
    }

    #[tokio::test]
    async fn test_set_aside_corrupted_file() {
        let path = get_path();
        fs::write(&path, "{ not json").await.unwrap();
        let storage = JsonFileStorage::new(&path);

        storage.set_aside().await.unwrap();
        let corrupt_path = storage.corrupt_path();
        let content = fs::read_to_string(&corrupt_path).await.unwrap();
        fs::remove_file(&corrupt_path).await.unwrap();

        assert_eq!(content, "{ not json");
        assert_eq!(storage.load().await, Ok(None));
    }
}
