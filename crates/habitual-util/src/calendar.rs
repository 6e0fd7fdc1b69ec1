//! Calendar utilities for habitual
//!
//! All timestamps are local wall-clock values (`NaiveDateTime`), stored as
//! text in the `YYYY-MM-DD HH:MM:SS[.ffffff]` format.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `HABITUAL_MOCK_TIME` environment variable can be set
//! to override the system time for [`now`]. This is useful for checking how
//! habits reconcile after days or weeks without waiting for them to pass.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)
//!
//! Example:
//! ```bash
//! HABITUAL_MOCK_TIME="2025-12-25 14:30:00" habitual --owner me unchecked
//! ```

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "HABITUAL_MOCK_TIME";

/// Format used when writing timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Formats accepted when reading timestamps, tried in order
pub const ACCEPTED_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    Ok(mock_dt) => {
                        let offset = mock_dt.signed_duration_since(Local::now().naive_local());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = "%Y-%m-%d %H:%M:%S",
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> NaiveDateTime {
    let real_now = Local::now().naive_local();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Parse a stored timestamp. Returns `None` if no accepted format matches.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ACCEPTED_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Format a timestamp for storage.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Midnight at the start of the given timestamp's day
pub fn start_of_day(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date().and_time(NaiveTime::MIN)
}

/// Midnight on the Monday of the given timestamp's week
pub fn start_of_week(ts: NaiveDateTime) -> NaiveDateTime {
    let days_since_monday = i64::from(ts.weekday().num_days_from_monday());
    start_of_day(ts) - Duration::days(days_since_monday)
}

/// True if both timestamps fall on the same calendar day
pub fn is_same_day(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.date() == b.date()
}

/// True if both timestamps fall in the same Monday-aligned week
pub fn is_same_week(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    start_of_week(a) == start_of_week(b)
}

/// The first day of the calendar month before the given timestamp's month
pub fn last_month(ts: NaiveDateTime) -> NaiveDate {
    let first_of_month = ts.date() - Duration::days(i64::from(ts.day0()));
    let last_of_previous = first_of_month - Duration::days(1);
    last_of_previous - Duration::days(i64::from(last_of_previous.day0()))
}

/// A timestamp as it was found in storage.
///
/// Historical rows may hold text that no longer parses. Those are kept
/// verbatim so they can be written back unchanged or repaired explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedTime {
    At(NaiveDateTime),
    Unparseable(String),
}

impl RecordedTime {
    pub fn parse(raw: &str) -> Self {
        match parse_timestamp(raw) {
            Some(ts) => Self::At(ts),
            None => Self::Unparseable(raw.to_string()),
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::At(ts) => Some(*ts),
            Self::Unparseable(_) => None,
        }
    }

    pub fn is_parseable(&self) -> bool {
        matches!(self, Self::At(_))
    }
}

impl From<NaiveDateTime> for RecordedTime {
    fn from(ts: NaiveDateTime) -> Self {
        Self::At(ts)
    }
}

impl fmt::Display for RecordedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(ts) => write!(f, "{}", format_timestamp(ts)),
            Self::Unparseable(raw) => write!(f, "{}", raw),
        }
    }
}
