//! Validated settings structures

use crate::schema::{
    RawConfig, RawLoggingConfig, RawPeriodicityConfig, RawReconcileConfig, RawStorageConfig,
};
use crate::validation::{parse_check_in_policy, parse_log_file_mode, parse_log_level};
use habitual_util::{Periodicity, default_data_dir};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

pub const DEFAULT_DAILY_CODE: &str = "0";
pub const DEFAULT_WEEKLY_CODE: &str = "1";
pub const DEFAULT_DATABASE: &str = "habits";

/// Roughly ten years of days
pub const DEFAULT_DAILY_MAX_PERIODS: u32 = 3650;
/// Roughly eight years of weeks
pub const DEFAULT_WEEKLY_MAX_PERIODS: u32 = 420;

/// Validated settings, passed explicitly to each component
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub tracking: TrackingPolicy,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            storage: StorageConfig::from_raw(raw.storage),
            logging: LoggingConfig::from_raw(raw.logging),
            tracking: TrackingPolicy::from_raw(raw.periodicity, raw.reconcile),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub database: String,
}

impl StorageConfig {
    fn from_raw(raw: RawStorageConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            database: raw
                .database
                .map(|d| d.trim().to_string())
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        }
    }

    /// Full path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.database))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::from_raw(RawStorageConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFileMode {
    #[default]
    Append,
    Truncate,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LevelFilter,
    pub file: Option<PathBuf>,
    pub mode: LogFileMode,
}

impl LoggingConfig {
    fn from_raw(raw: RawLoggingConfig) -> Self {
        Self {
            level: raw
                .level
                .and_then(|l| parse_log_level(&l).ok())
                .unwrap_or(LevelFilter::WARN),
            file: raw.file,
            mode: raw
                .mode
                .and_then(|m| parse_log_file_mode(&m).ok())
                .unwrap_or_default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::from_raw(RawLoggingConfig::default())
    }
}

/// Everything the habit engine needs to interpret and reconcile stored habits
#[derive(Debug, Clone, Default)]
pub struct TrackingPolicy {
    pub codes: PeriodicityCodes,
    pub limits: ReconcileLimits,
    pub corrupt_last_checked: CorruptCheckInPolicy,
}

impl TrackingPolicy {
    fn from_raw(periodicity: RawPeriodicityConfig, reconcile: RawReconcileConfig) -> Self {
        Self {
            codes: PeriodicityCodes::from_raw(periodicity),
            limits: ReconcileLimits {
                daily_max_periods: reconcile
                    .daily_max_periods
                    .unwrap_or(DEFAULT_DAILY_MAX_PERIODS),
                weekly_max_periods: reconcile
                    .weekly_max_periods
                    .unwrap_or(DEFAULT_WEEKLY_MAX_PERIODS),
            },
            corrupt_last_checked: reconcile
                .corrupt_last_checked
                .and_then(|p| parse_check_in_policy(&p).ok())
                .unwrap_or_default(),
        }
    }
}

/// Mapping between periodicities and the codes stored for them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicityCodes {
    daily: String,
    weekly: String,
}

impl PeriodicityCodes {
    pub fn new(daily: impl Into<String>, weekly: impl Into<String>) -> Self {
        Self {
            daily: daily.into(),
            weekly: weekly.into(),
        }
    }

    fn from_raw(raw: RawPeriodicityConfig) -> Self {
        Self::new(
            raw.daily
                .map(|c| c.trim().to_string())
                .unwrap_or_else(|| DEFAULT_DAILY_CODE.to_string()),
            raw.weekly
                .map(|c| c.trim().to_string())
                .unwrap_or_else(|| DEFAULT_WEEKLY_CODE.to_string()),
        )
    }

    /// The stored code for a periodicity
    pub fn code(&self, periodicity: Periodicity) -> &str {
        match periodicity {
            Periodicity::Daily => &self.daily,
            Periodicity::Weekly => &self.weekly,
        }
    }

    /// Resolve a stored code, or a periodicity name used as an alias
    pub fn parse(&self, value: &str) -> Option<Periodicity> {
        let value = value.trim();
        if value == self.daily {
            Some(Periodicity::Daily)
        } else if value == self.weekly {
            Some(Periodicity::Weekly)
        } else {
            Periodicity::from_name(value)
        }
    }

    /// (periodicity, code) pairs in a stable order
    pub fn entries(&self) -> [(Periodicity, &str); 2] {
        [
            (Periodicity::Daily, self.daily.as_str()),
            (Periodicity::Weekly, self.weekly.as_str()),
        ]
    }
}

impl Default for PeriodicityCodes {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_CODE, DEFAULT_WEEKLY_CODE)
    }
}

/// Upper bound on periods backfilled by one reconciliation pass.
/// Guards against corrupted timestamps far in the past.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileLimits {
    pub daily_max_periods: u32,
    pub weekly_max_periods: u32,
}

impl ReconcileLimits {
    pub fn max_periods(&self, periodicity: Periodicity) -> u32 {
        match periodicity {
            Periodicity::Daily => self.daily_max_periods,
            Periodicity::Weekly => self.weekly_max_periods,
        }
    }
}

impl Default for ReconcileLimits {
    fn default() -> Self {
        Self {
            daily_max_periods: DEFAULT_DAILY_MAX_PERIODS,
            weekly_max_periods: DEFAULT_WEEKLY_MAX_PERIODS,
        }
    }
}

/// What to do when a stored last check-in cannot be parsed.
///
/// `CreditAsChecked` overwrites it with the current time, advances the streak
/// and reports the habit as done. It rewards corrupted data and is kept for
/// compatibility with existing databases until someone decides otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptCheckInPolicy {
    #[default]
    CreditAsChecked,
    /// Report the habit as not done and leave the stored value alone
    TreatAsUnchecked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_resolve_values_and_aliases() {
        let codes = PeriodicityCodes::new("d", "w");
        assert_eq!(codes.parse("d"), Some(Periodicity::Daily));
        assert_eq!(codes.parse("w"), Some(Periodicity::Weekly));
        assert_eq!(codes.parse("Weekly"), Some(Periodicity::Weekly));
        assert_eq!(codes.parse("2"), None);
        assert_eq!(codes.code(Periodicity::Weekly), "w");
    }

    #[test]
    fn default_limits() {
        let limits = ReconcileLimits::default();
        assert_eq!(limits.max_periods(Periodicity::Daily), 3650);
        assert_eq!(limits.max_periods(Periodicity::Weekly), 420);
    }

    #[test]
    fn database_path_appends_extension() {
        let storage = StorageConfig {
            data_dir: PathBuf::from("/data"),
            database: "habits".into(),
        };
        assert_eq!(storage.database_path(), PathBuf::from("/data/habits.db"));
    }
}
