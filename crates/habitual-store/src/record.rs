//! Raw habit records

use habitual_util::{HabitId, OwnerId};
use serde::{Deserialize, Serialize};

/// Serialized break history of a habit that has never missed a period
pub const EMPTY_BREAK_HISTORY: &str = "{}";

/// A habit exactly as persisted.
///
/// Timestamps, periodicity and break history are kept as text: interpreting
/// (and tolerating) them is up to the habit engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitRecord {
    pub id: HabitId,
    pub owner_id: OwnerId,
    pub title: String,
    pub description: String,
    /// Stored periodicity code
    pub periodicity: String,
    pub created_at: String,
    pub last_break: Option<String>,
    pub last_checked: Option<String>,
    pub streak: u32,
    pub longest_streak: u32,
    /// JSON object `{"<year>": {"<month>": count}}`
    pub break_history: String,
}

/// A habit about to be created; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabitRecord {
    pub owner_id: OwnerId,
    pub title: String,
    pub description: String,
    pub periodicity: String,
    pub created_at: String,
}

impl NewHabitRecord {
    /// The full record of this habit once it has been assigned `id`
    pub fn into_record(self, id: HabitId) -> HabitRecord {
        HabitRecord {
            id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            periodicity: self.periodicity,
            created_at: self.created_at,
            last_break: None,
            last_checked: None,
            streak: 0,
            longest_streak: 0,
            break_history: EMPTY_BREAK_HISTORY.to_string(),
        }
    }
}

/// Treat legacy empty-string timestamps as absent
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
