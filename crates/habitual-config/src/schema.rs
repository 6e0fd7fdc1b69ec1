//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Where habits are persisted
    #[serde(default)]
    pub storage: RawStorageConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: RawLoggingConfig,

    /// Stored codes for each periodicity
    #[serde(default)]
    pub periodicity: RawPeriodicityConfig,

    /// Reconciliation tuning
    #[serde(default)]
    pub reconcile: RawReconcileConfig,
}

/// Storage settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStorageConfig {
    /// Data directory for the database (default: ~/.local/share/habitual)
    pub data_dir: Option<PathBuf>,

    /// Database file stem, `.db` is appended (default: "habits")
    pub database: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLoggingConfig {
    /// Level filter: "trace", "debug", "info", "warn", "error" or "off"
    pub level: Option<String>,

    /// Write logs to this file instead of stderr
    pub file: Option<PathBuf>,

    /// "append" or "truncate"
    pub mode: Option<String>,
}

/// Codes written to the `periodicity` column
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPeriodicityConfig {
    pub daily: Option<String>,
    pub weekly: Option<String>,
}

/// Reconciliation settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawReconcileConfig {
    /// Most daily periods backfilled in one pass
    pub daily_max_periods: Option<u32>,

    /// Most weekly periods backfilled in one pass
    pub weekly_max_periods: Option<u32>,

    /// What `is_checked` does with an unparseable last check-in:
    /// "credit_as_checked" or "treat_as_unchecked"
    pub corrupt_last_checked: Option<String>,
}
