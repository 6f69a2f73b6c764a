//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the shell starts with zero configuration.

use std::path::PathBuf;
use std::time::Duration;

use musicschool_shared::constants::{DEFAULT_HISTORY_DAYS, DEFAULT_TICK_MILLIS, MAX_HISTORY_DAYS};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Directory holding `musicschool.db`.
    /// Env: `MUSICSCHOOL_DATA_DIR`
    /// Default: the platform data directory, or `./musicschool-data`.
    pub data_dir: PathBuf,

    /// Refresh period of the running session display.
    /// Env: `MUSICSCHOOL_TICK_MS`
    /// Default: `1000`
    pub tick_interval: Duration,

    /// Days of history loaded on refresh.
    /// Env: `MUSICSCHOOL_HISTORY_DAYS`
    /// Default: `7`, at most `3650`
    pub history_days: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let data_dir = musicschool_store::database::default_data_dir()
            .unwrap_or_else(|_| PathBuf::from("./musicschool-data"));
        Self {
            data_dir,
            tick_interval: Duration::from_millis(DEFAULT_TICK_MILLIS),
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("MUSICSCHOOL_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if let Some(val) = lookup("MUSICSCHOOL_TICK_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.tick_interval = Duration::from_millis(ms),
                _ => tracing::warn!(value = %val, "Invalid MUSICSCHOOL_TICK_MS, using default"),
            }
        }

        if let Some(val) = lookup("MUSICSCHOOL_HISTORY_DAYS") {
            match val.parse::<u32>() {
                Ok(days) if days <= MAX_HISTORY_DAYS => config.history_days = days,
                _ => {
                    tracing::warn!(value = %val, "Invalid MUSICSCHOOL_HISTORY_DAYS, using default")
                }
            }
        }

        config
    }

    /// Path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("musicschool.db")
    }
}
