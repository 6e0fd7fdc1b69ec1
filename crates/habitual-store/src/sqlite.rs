//! SQLite-based store implementation

use habitual_util::{HabitId, OwnerId};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::record::non_empty;
use crate::{
    EMPTY_BREAK_HISTORY, HabitRecord, HabitStore, NewHabitRecord, StoreError, StoreResult,
};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS habits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                periodicity TEXT NOT NULL,
                created_at TEXT NOT NULL,
                deactivated INTEGER NOT NULL DEFAULT 0,
                last_break TEXT,
                last_checked TEXT,
                streak INTEGER NOT NULL DEFAULT 0,
                longest_streak INTEGER NOT NULL DEFAULT 0,
                break_history TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_habits_owner ON habits(owner_id, deactivated);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

impl HabitStore for SqliteStore {
    fn load_habits(&self, owner: &OwnerId) -> StoreResult<Vec<HabitRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            r#"
            SELECT id, owner_id, title, description, periodicity, created_at,
                   last_break, last_checked, streak, longest_streak, break_history
            FROM habits
            WHERE owner_id = ? AND deactivated = 0
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([owner.as_str()], |row| {
            let streak: i64 = row.get(8)?;
            let longest_streak: i64 = row.get(9)?;
            Ok(HabitRecord {
                id: HabitId::new(row.get(0)?),
                owner_id: OwnerId::new(row.get::<_, String>(1)?),
                title: row.get(2)?,
                description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                periodicity: row.get(4)?,
                created_at: row.get(5)?,
                last_break: non_empty(row.get(6)?),
                last_checked: non_empty(row.get(7)?),
                streak: u32::try_from(streak).unwrap_or_default(),
                longest_streak: u32::try_from(longest_streak).unwrap_or_default(),
                break_history: row
                    .get::<_, Option<String>>(10)?
                    .unwrap_or_else(|| EMPTY_BREAK_HISTORY.to_string()),
            })
        })?;

        let records = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(owner = %owner, count = records.len(), "Habits loaded");
        Ok(records)
    }

    fn insert_habit(&self, habit: &NewHabitRecord) -> StoreResult<HabitId> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            INSERT INTO habits (owner_id, title, description, periodicity, created_at, break_history)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                habit.owner_id.as_str(),
                habit.title,
                habit.description,
                habit.periodicity,
                habit.created_at,
                EMPTY_BREAK_HISTORY,
            ],
        )?;

        let id = HabitId::new(conn.last_insert_rowid());
        debug!(habit_id = %id, owner = %habit.owner_id, "Habit inserted");
        Ok(id)
    }

    fn upsert_habit(&self, record: &HabitRecord) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let changed = conn.execute(
            r#"
            INSERT INTO habits (id, owner_id, title, description, periodicity, created_at,
                                last_break, last_checked, streak, longest_streak, break_history)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id)
            DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                last_break = excluded.last_break,
                last_checked = excluded.last_checked,
                streak = excluded.streak,
                longest_streak = excluded.longest_streak,
                break_history = excluded.break_history
            WHERE habits.owner_id = excluded.owner_id
            "#,
            params![
                record.id.get(),
                record.owner_id.as_str(),
                record.title,
                record.description,
                record.periodicity,
                record.created_at,
                record.last_break,
                record.last_checked,
                record.streak,
                record.longest_streak,
                record.break_history,
            ],
        )?;

        if changed == 0 {
            warn!(habit_id = %record.id, owner = %record.owner_id, "Upsert rejected: owner mismatch");
            return Err(StoreError::NotFound(format!(
                "habit {} for owner {}",
                record.id, record.owner_id
            )));
        }

        debug!(habit_id = %record.id, "Habit saved");
        Ok(())
    }

    fn deactivate_habit(&self, id: HabitId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let changed = conn.execute(
            "UPDATE habits SET deactivated = 1 WHERE id = ?",
            [id.get()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("habit {}", id)));
        }

        debug!(habit_id = %id, "Habit deactivated");
        Ok(())
    }

    fn deactivate_all_for_owner(&self, owner: &OwnerId) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();

        let changed = conn.execute(
            "UPDATE habits SET deactivated = 1 WHERE owner_id = ? AND deactivated = 0",
            [owner.as_str()],
        )?;

        debug!(owner = %owner, count = changed, "Habits deactivated");
        Ok(changed)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
