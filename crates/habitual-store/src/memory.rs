//! In-memory store implementation

use habitual_util::{HabitId, OwnerId};
use std::sync::Mutex;
use tracing::debug;

use crate::{HabitRecord, HabitStore, NewHabitRecord, StoreError, StoreResult};

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    /// Records in insertion order, with their deactivation flag
    records: Vec<(HabitRecord, bool)>,
}

/// Volatile store, used by tests and `--ephemeral` sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with already-persisted records
    pub fn with_records(records: impl IntoIterator<Item = HabitRecord>) -> Self {
        let records: Vec<_> = records.into_iter().map(|r| (r, false)).collect();
        let next_id = records.iter().map(|(r, _)| r.id.get()).max().unwrap_or(0);
        Self {
            state: Mutex::new(MemoryState { next_id, records }),
        }
    }

    /// Every record ever stored, deactivated ones included
    pub fn all_records(&self) -> Vec<HabitRecord> {
        let state = self.state.lock().unwrap();
        state.records.iter().map(|(r, _)| r.clone()).collect()
    }
}

impl HabitStore for MemoryStore {
    fn load_habits(&self, owner: &OwnerId) -> StoreResult<Vec<HabitRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .filter(|(r, deactivated)| !deactivated && &r.owner_id == owner)
            .map(|(r, _)| r.clone())
            .collect())
    }

    fn insert_habit(&self, habit: &NewHabitRecord) -> StoreResult<HabitId> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = HabitId::new(state.next_id);
        state.records.push((habit.clone().into_record(id), false));
        debug!(habit_id = %id, owner = %habit.owner_id, "Habit inserted");
        Ok(id)
    }

    fn upsert_habit(&self, record: &HabitRecord) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();

        match state.records.iter_mut().find(|(r, _)| r.id == record.id) {
            Some((stored, _)) if stored.owner_id == record.owner_id => {
                stored.title = record.title.clone();
                stored.description = record.description.clone();
                stored.last_break = record.last_break.clone();
                stored.last_checked = record.last_checked.clone();
                stored.streak = record.streak;
                stored.longest_streak = record.longest_streak;
                stored.break_history = record.break_history.clone();
                Ok(())
            }
            Some(_) => Err(StoreError::NotFound(format!(
                "habit {} for owner {}",
                record.id, record.owner_id
            ))),
            None => {
                state.next_id = state.next_id.max(record.id.get());
                state.records.push((record.clone(), false));
                Ok(())
            }
        }
    }

    fn deactivate_habit(&self, id: HabitId) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let (_, deactivated) = state
            .records
            .iter_mut()
            .find(|(r, _)| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("habit {}", id)))?;
        *deactivated = true;
        Ok(())
    }

    fn deactivate_all_for_owner(&self, owner: &OwnerId) -> StoreResult<usize> {
        let mut state = self.state.lock().unwrap();
        let mut count = 0;
        for (record, deactivated) in state.records.iter_mut() {
            if !*deactivated && &record.owner_id == owner {
                *deactivated = true;
                count += 1;
            }
        }
        Ok(count)
    }

    fn is_healthy(&self) -> bool {
        self.state.lock().is_ok()
    }
}
