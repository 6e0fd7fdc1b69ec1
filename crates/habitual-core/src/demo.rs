//! Demo habits for trying habitual out

use chrono::{Duration, NaiveDateTime};
use habitual_config::PeriodicityCodes;
use habitual_store::{HabitStore, NewHabitRecord};
use habitual_util::{HabitId, OwnerId, Periodicity, format_timestamp};
use tracing::debug;

use crate::{BreakHistory, HabitResult};

/// Owner of most demo habits
pub const DEMO_OWNER: &str = "demo";

/// A second owner, to show that owners are kept apart
pub const DEMO_ALT_OWNER: &str = "demo-alt";

struct DemoHabit {
    owner: &'static str,
    title: &'static str,
    description: &'static str,
    periodicity: Periodicity,
    created_days_ago: i64,
    last_checked_days_ago: Option<i64>,
    last_break_days_ago: Option<i64>,
    streak: u32,
    /// Days missed right after creation, counted into the break history
    missed_after_creation: i64,
}

const DEMO_HABITS: [DemoHabit; 5] = [
    DemoHabit {
        owner: DEMO_OWNER,
        title: "Quit smoking",
        description: "",
        periodicity: Periodicity::Daily,
        created_days_ago: 28,
        last_checked_days_ago: Some(14),
        last_break_days_ago: None,
        streak: 13,
        missed_after_creation: 0,
    },
    DemoHabit {
        owner: DEMO_OWNER,
        title: "Go for a walk",
        description: "It doesn't matter how long",
        periodicity: Periodicity::Daily,
        created_days_ago: 42,
        last_checked_days_ago: Some(1),
        last_break_days_ago: None,
        streak: 41,
        missed_after_creation: 0,
    },
    DemoHabit {
        owner: DEMO_OWNER,
        title: "Vacuum",
        description: "All rooms",
        periodicity: Periodicity::Weekly,
        created_days_ago: 49,
        last_checked_days_ago: Some(7),
        last_break_days_ago: None,
        streak: 6,
        missed_after_creation: 0,
    },
    DemoHabit {
        owner: DEMO_OWNER,
        title: "Walk the fish",
        description: "It's a goldfish",
        periodicity: Periodicity::Daily,
        created_days_ago: 56,
        last_checked_days_ago: None,
        last_break_days_ago: Some(49),
        streak: 0,
        missed_after_creation: 8,
    },
    DemoHabit {
        owner: DEMO_ALT_OWNER,
        title: "Go for a walk",
        description: "Or not",
        periodicity: Periodicity::Daily,
        created_days_ago: 56,
        last_checked_days_ago: None,
        last_break_days_ago: None,
        streak: 0,
        missed_after_creation: 0,
    },
];

/// Insert the demo habits, dated relative to `now`, and return their ids.
///
/// Existing habits are left alone; seeding twice adds a second set.
pub fn seed_demo_habits(
    store: &dyn HabitStore,
    codes: &PeriodicityCodes,
    now: NaiveDateTime,
) -> HabitResult<Vec<HabitId>> {
    let days_ago = |days: i64| now - Duration::days(days);
    let mut ids = Vec::with_capacity(DEMO_HABITS.len());

    for demo in &DEMO_HABITS {
        let created = days_ago(demo.created_days_ago);
        let new_habit = NewHabitRecord {
            owner_id: OwnerId::new(demo.owner),
            title: demo.title.to_string(),
            description: demo.description.to_string(),
            periodicity: codes.code(demo.periodicity).to_string(),
            created_at: format_timestamp(&created),
        };

        let id = store.insert_habit(&new_habit)?;

        let mut history = BreakHistory::new();
        for day in 0..demo.missed_after_creation {
            history.record((created + Duration::days(day)).date());
        }

        let mut record = new_habit.into_record(id);
        record.last_checked = demo
            .last_checked_days_ago
            .map(|days| format_timestamp(&days_ago(days)));
        record.last_break = demo
            .last_break_days_ago
            .map(|days| format_timestamp(&days_ago(days)));
        record.streak = demo.streak;
        record.longest_streak = demo.streak;
        record.break_history = history.to_json();
        store.upsert_habit(&record)?;

        debug!(habit_id = %id, owner = demo.owner, title = demo.title, "Demo habit added");
        ids.push(id);
    }

    Ok(ids)
}
