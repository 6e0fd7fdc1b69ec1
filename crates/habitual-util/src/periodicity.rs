//! Habit recurrence units

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{is_same_day, is_same_week, start_of_day, start_of_week};

/// How often a habit is due: once per calendar day, or once per Monday-aligned week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Daily,
    Weekly,
}

impl Periodicity {
    pub const ALL: [Periodicity; 2] = [Periodicity::Daily, Periodicity::Weekly];

    pub fn name(&self) -> &'static str {
        match self {
            Periodicity::Daily => "daily",
            Periodicity::Weekly => "weekly",
        }
    }

    /// Case-insensitive lookup by name ("daily", "weekly")
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Length of one period
    pub fn step(&self) -> Duration {
        match self {
            Periodicity::Daily => Duration::days(1),
            Periodicity::Weekly => Duration::weeks(1),
        }
    }

    /// Start of the period containing `ts`
    pub fn period_start(&self, ts: NaiveDateTime) -> NaiveDateTime {
        match self {
            Periodicity::Daily => start_of_day(ts),
            Periodicity::Weekly => start_of_week(ts),
        }
    }

    /// True if both timestamps fall in the same period
    pub fn same_period(&self, a: NaiveDateTime, b: NaiveDateTime) -> bool {
        match self {
            Periodicity::Daily => is_same_day(a, b),
            Periodicity::Weekly => is_same_week(a, b),
        }
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
