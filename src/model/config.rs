use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default data file name, relative to the data directory
pub const DEFAULT_TASKS_FILE: &str = "tasks.txt";

/// Seconds between periodic sweeps
pub const SWEEP_INTERVAL_SECS: u64 = 60;

/// Lookahead used by the long-running watch loop
pub const DUE_SOON_MINUTES: i64 = 3;

/// Lookahead used by the one-shot reminder check
pub const EARLY_WARNING_MINUTES: i64 = 10;

/// Horizon for the urgent-task query
pub const URGENT_HOURS: i64 = 24;

/// Horizon for the imminent-task query
pub const IMMINENT_MINUTES: i64 = 60;

/// Configuration from tickler.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub queries: QueryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Data file, relative to the data directory unless absolute
    #[serde(default = "default_file")]
    pub file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            file: default_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_due_soon")]
    pub due_soon_minutes: i64,
    #[serde(default = "default_early_warning")]
    pub early_warning_minutes: i64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        ReminderConfig {
            sweep_interval_secs: SWEEP_INTERVAL_SECS,
            due_soon_minutes: DUE_SOON_MINUTES,
            early_warning_minutes: EARLY_WARNING_MINUTES,
        }
    }
}

impl ReminderConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn due_soon_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.due_soon_minutes)
    }

    pub fn early_warning_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.early_warning_minutes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_urgent_hours")]
    pub urgent_hours: i64,
    #[serde(default = "default_imminent_minutes")]
    pub imminent_minutes: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            urgent_hours: URGENT_HOURS,
            imminent_minutes: IMMINENT_MINUTES,
        }
    }
}

impl QueryConfig {
    pub fn urgent_horizon(&self) -> chrono::Duration {
        chrono::Duration::hours(self.urgent_hours)
    }

    pub fn imminent_horizon(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.imminent_minutes)
    }
}

fn default_file() -> String {
    DEFAULT_TASKS_FILE.to_string()
}

fn default_sweep_interval() -> u64 {
    SWEEP_INTERVAL_SECS
}

fn default_due_soon() -> i64 {
    DUE_SOON_MINUTES
}

fn default_early_warning() -> i64 {
    EARLY_WARNING_MINUTES
}

fn default_urgent_hours() -> i64 {
    URGENT_HOURS
}

fn default_imminent_minutes() -> i64 {
    IMMINENT_MINUTES
}
