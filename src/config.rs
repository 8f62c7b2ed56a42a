use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};

pub const DEFAULT_RETENTION_HOURS: u64 = 7 * 24;

// Timings of the giveaway lifecycle.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EngineConfig {
    // How often the announcement is refreshed while far from the end.
    pub status_refresh_interval: Duration,
    // When the "one minute left" warning is sent.
    pub warning_threshold: Duration,
    // Length of the final per-second countdown.
    pub countdown_seconds: u64,
    // How long finished giveaways are kept for rerolls.
    pub retention: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            status_refresh_interval: Duration::from_secs(60),
            warning_threshold: Duration::from_secs(60),
            countdown_seconds: 10,
            retention: Duration::from_secs(DEFAULT_RETENTION_HOURS * 60 * 60),
        }
    }
}

impl EngineConfig {
    pub fn countdown_window(&self) -> Duration {
        Duration::from_secs(self.countdown_seconds)
    }
}

#[readonly::make]
#[derive(Clone)]
pub struct Config {
    pub token: String,
    // Where the giveaways are saved between restarts. Nothing is saved
    // when it's not set.
    pub state_path: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = match lookup("DISCORD_TOKEN") {
            Some(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => {
                let message = "Expected a DISCORD_TOKEN in the environment.".to_string();
                return Err(Error::from(ErrorKind::Config(message)));
            }
        };

        let state_path = lookup("GIVEAWAY_STATE_PATH")
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        let retention_hours = match lookup("GIVEAWAY_RETENTION_HOURS") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                let message = format!(
                    "GIVEAWAY_RETENTION_HOURS must be a number of hours, got `{}`.",
                    value
                );
                Error::from(ErrorKind::Config(message))
            })?,
            None => DEFAULT_RETENTION_HOURS,
        };

        let retention_seconds = retention_hours.checked_mul(60 * 60).ok_or_else(|| {
            let message = format!("GIVEAWAY_RETENTION_HOURS is too big, got `{}`.", retention_hours);
            Error::from(ErrorKind::Config(message))
        })?;

        let engine = EngineConfig {
            retention: Duration::from_secs(retention_seconds),
            ..EngineConfig::default()
        };

        Ok(Config {
            token,
            state_path,
            engine,
        })
    }
}
