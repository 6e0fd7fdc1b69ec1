//! Break history: missed periods counted per calendar month

use chrono::{Datelike, NaiveDate};
use habitual_util::HabitId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Sparse year -> month -> miss count map.
///
/// Serialized as `{"2025": {"3": 4}}`. Counts only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakHistory(BTreeMap<i32, BTreeMap<u32, u32>>);

impl BreakHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse stored history. Malformed payloads are treated as empty.
    pub fn parse_lenient(raw: &str, habit_id: HabitId) -> Self {
        if raw.trim().is_empty() {
            return Self::new();
        }

        match serde_json::from_str(raw) {
            Ok(history) => history,
            Err(e) => {
                warn!(
                    habit_id = %habit_id,
                    error = %e,
                    "Malformed break history, starting from empty"
                );
                Self::new()
            }
        }
    }

    /// Count one missed period under the month of `date`
    pub fn record(&mut self, date: NaiveDate) {
        let count = self
            .0
            .entry(date.year())
            .or_default()
            .entry(date.month())
            .or_default();
        *count = count.saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        self.0
            .values()
            .flat_map(|months| months.values())
            .map(|&count| u64::from(count))
            .sum()
    }

    /// Misses recorded for a month, `None` if the month has no entry
    pub fn in_month(&self, year: i32, month: u32) -> Option<u32> {
        self.0.get(&year).and_then(|months| months.get(&month)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// (year, month, count) entries, oldest first
    pub fn months(&self) -> impl Iterator<Item = (i32, u32, u32)> + '_ {
        self.0.iter().flat_map(|(&year, months)| {
            months.iter().map(move |(&month, &count)| (year, month, count))
        })
    }

    pub fn to_json(&self) -> String {
        // Integer keys and counts always serialize
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}
