//! Store trait definitions

use habitual_util::{HabitId, OwnerId};

use crate::{HabitRecord, NewHabitRecord, StoreResult};

/// Storage collaborator for habits.
///
/// Stores persist what they are given. Reconciling elapsed time is the
/// habit engine's job and happens only when a record is loaded.
pub trait HabitStore: Send + Sync {
    /// Load all active habits of an owner, in insertion order.
    /// Deactivated habits are never returned.
    fn load_habits(&self, owner: &OwnerId) -> StoreResult<Vec<HabitRecord>>;

    /// Persist a new habit and return its assigned id
    fn insert_habit(&self, habit: &NewHabitRecord) -> StoreResult<HabitId>;

    /// Write the mutable fields of a habit. Idempotent.
    ///
    /// Periodicity and creation time are never rewritten, and a record whose
    /// owner does not match the stored one is rejected.
    fn upsert_habit(&self, record: &HabitRecord) -> StoreResult<()>;

    /// Soft-delete a single habit
    fn deactivate_habit(&self, id: HabitId) -> StoreResult<()>;

    /// Soft-delete every habit of an owner, returning how many were affected
    fn deactivate_all_for_owner(&self, owner: &OwnerId) -> StoreResult<usize>;

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
