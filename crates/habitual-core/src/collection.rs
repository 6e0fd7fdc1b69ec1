//! Per-owner habit collection
//!
//! The store is authoritative. Every mutation is written through and followed
//! by a full reload, so the in-memory list is never patched in place.

use chrono::NaiveDateTime;
use habitual_config::TrackingPolicy;
use habitual_store::{HabitStore, NewHabitRecord};
use habitual_util::{Clock, HabitId, OwnerId, Periodicity, format_timestamp};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{CheckOutcome, Habit, HabitError, HabitResult, seed_demo_habits};

/// Habits ordered by break count, with the counts alongside
#[derive(Debug)]
pub struct BreakRanking<'a> {
    pub habits: Vec<&'a Habit>,
    pub breaks: Vec<u64>,
}

impl<'a> BreakRanking<'a> {
    fn new() -> Self {
        Self {
            habits: Vec::new(),
            breaks: Vec::new(),
        }
    }

    /// Insert before the first entry whose count is not greater
    fn insert_ranked(&mut self, habit: &'a Habit, count: u64) {
        match self.breaks.iter().position(|&existing| existing <= count) {
            Some(index) => {
                self.habits.insert(index, habit);
                self.breaks.insert(index, count);
            }
            None => self.push(habit, count),
        }
    }

    fn push(&mut self, habit: &'a Habit, count: u64) {
        self.habits.push(habit);
        self.breaks.push(count);
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a Habit, u64)> + '_ {
        self.habits.iter().copied().zip(self.breaks.iter().copied())
    }
}

/// The habits of the currently selected owner
pub struct HabitCollection {
    store: Arc<dyn HabitStore>,
    clock: Arc<dyn Clock>,
    policy: TrackingPolicy,
    owner: Option<OwnerId>,
    habits: Vec<Habit>,
}

impl HabitCollection {
    pub fn new(store: Arc<dyn HabitStore>, clock: Arc<dyn Clock>, policy: TrackingPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
            owner: None,
            habits: Vec::new(),
        }
    }

    /// Switch to another owner and load their habits.
    ///
    /// If their habits cannot be loaded, the previous owner stays selected.
    pub fn select_owner(&mut self, owner: OwnerId) -> HabitResult<()> {
        debug!(owner = %owner, "Selecting owner");
        let habits = self.load(&owner)?;
        self.owner = Some(owner);
        self.habits = habits;
        Ok(())
    }

    pub fn has_owner(&self) -> bool {
        self.owner.is_some()
    }

    pub fn owner(&self) -> Option<&OwnerId> {
        self.owner.as_ref()
    }

    /// Reload all habits of the current owner from the store
    pub fn refresh(&mut self) -> HabitResult<()> {
        self.reload()
    }

    /// Stored code of each periodicity
    pub fn periodicities(&self) -> [(Periodicity, &str); 2] {
        self.policy.codes.entries()
    }

    /// Create a habit for the current owner, returning its id
    pub fn add_habit(
        &mut self,
        title: &str,
        description: &str,
        periodicity: &str,
    ) -> HabitResult<HabitId> {
        let owner = self.require_owner()?.clone();
        let periodicity = self.parse_periodicity(periodicity)?;

        let title = title.trim();
        if title.is_empty() {
            return Err(HabitError::EmptyTitle);
        }

        let new_habit = NewHabitRecord {
            owner_id: owner.clone(),
            title: title.to_string(),
            description: description.trim().to_string(),
            periodicity: self.policy.codes.code(periodicity).to_string(),
            created_at: format_timestamp(&self.now()),
        };

        let id = self.store.insert_habit(&new_habit)?;
        info!(habit_id = %id, owner = %owner, periodicity = %periodicity, "Habit created");

        self.reload()?;
        Ok(id)
    }

    /// Change title and/or description. Empty or absent values are left untouched.
    pub fn edit_habit(
        &mut self,
        id: HabitId,
        title: Option<&str>,
        description: Option<&str>,
    ) -> HabitResult<()> {
        let owner = self.require_owner()?.clone();
        let mut habit = self.find(id)?.clone();

        if let Some(title) = title.map(str::trim)
            && !title.is_empty()
        {
            habit.set_title(title, &owner)?;
        }
        if let Some(description) = description.map(str::trim)
            && !description.is_empty()
        {
            habit.set_description(description, &owner)?;
        }

        self.store.upsert_habit(&habit.to_record())?;
        info!(habit_id = %id, "Habit edited");
        self.reload()
    }

    /// Soft-delete one of the current owner's habits
    pub fn delete_habit(&mut self, id: HabitId) -> HabitResult<()> {
        let owner = self.require_owner()?;
        let habit = self.find(id)?;
        if habit.owner_id() != owner {
            return Err(HabitError::PermissionDenied {
                habit_id: id,
                requester: owner.clone(),
            });
        }

        self.store.deactivate_habit(id)?;
        info!(habit_id = %id, "Habit deleted");
        self.reload()
    }

    /// Soft-delete every habit of `owner`, returning how many were affected.
    ///
    /// Works for any owner; the collection reloads only if it was showing them.
    pub fn delete_all_for_owner(&mut self, owner: &OwnerId) -> HabitResult<usize> {
        let count = self.store.deactivate_all_for_owner(owner)?;
        info!(owner = %owner, count, "All habits deleted");

        if self.owner.as_ref() == Some(owner) {
            self.reload()?;
        }
        Ok(count)
    }

    /// Add the demo habits of [`crate::DEMO_OWNER`] and [`crate::DEMO_ALT_OWNER`]
    pub fn seed_demo(&mut self) -> HabitResult<Vec<HabitId>> {
        let ids = seed_demo_habits(self.store.as_ref(), &self.policy.codes, self.now())?;
        info!(count = ids.len(), "Demo habits added");

        if self.has_owner() {
            self.reload()?;
        }
        Ok(ids)
    }

    /// Check a habit off for the current period and persist the result
    pub fn check_habit(&mut self, id: HabitId) -> HabitResult<CheckOutcome> {
        let owner = self.require_owner()?.clone();
        let now = self.now();
        let mut habit = self.find(id)?.clone();

        let outcome = habit.check(&owner, now)?;
        self.store.upsert_habit(&habit.to_record())?;
        self.reload()?;
        Ok(outcome)
    }

    /// All habits, in store order
    pub fn habits(&mut self, refresh: bool) -> HabitResult<&[Habit]> {
        self.prepare(refresh)?;
        Ok(&self.habits)
    }

    pub fn habit(&mut self, id: HabitId, refresh: bool) -> HabitResult<&Habit> {
        self.prepare(refresh)?;
        self.find(id)
    }

    /// Habits with the given periodicity (stored code or name)
    pub fn filter_by_periodicity(
        &mut self,
        periodicity: &str,
        refresh: bool,
    ) -> HabitResult<Vec<&Habit>> {
        self.prepare(refresh)?;
        let periodicity = self.parse_periodicity(periodicity)?;
        Ok(self
            .habits
            .iter()
            .filter(|h| h.periodicity() == periodicity)
            .collect())
    }

    /// Highest current streak first; ties keep store order
    pub fn sort_by_streak(&mut self, refresh: bool) -> HabitResult<Vec<&Habit>> {
        self.prepare(refresh)?;
        let mut sorted: Vec<&Habit> = self.habits.iter().collect();
        sorted.sort_by(|a, b| b.streak().cmp(&a.streak()));
        Ok(sorted)
    }

    /// Highest longest streak first; ties keep store order
    pub fn sort_by_longest_streak(&mut self, refresh: bool) -> HabitResult<Vec<&Habit>> {
        self.prepare(refresh)?;
        let mut sorted: Vec<&Habit> = self.habits.iter().collect();
        sorted.sort_by(|a, b| b.longest_streak().cmp(&a.longest_streak()));
        Ok(sorted)
    }

    /// Most breaks overall first.
    ///
    /// A habit is placed before the first habit with an equal or smaller
    /// count, so among equal counts the later habit comes first.
    pub fn rank_by_total_breaks(&mut self, refresh: bool) -> HabitResult<BreakRanking<'_>> {
        self.prepare(refresh)?;

        let mut ranking = BreakRanking::new();
        for habit in &self.habits {
            ranking.insert_ranked(habit, habit.total_breaks());
        }
        debug!(breaks = ?ranking.breaks, "Ranked by total breaks");
        Ok(ranking)
    }

    /// Most breaks in the previous calendar month first.
    ///
    /// Same placement as [`Self::rank_by_total_breaks`], except habits without
    /// breaks last month are appended in store order.
    pub fn rank_by_last_month_breaks(&mut self, refresh: bool) -> HabitResult<BreakRanking<'_>> {
        self.prepare(refresh)?;
        let now = self.now();

        let mut ranking = BreakRanking::new();
        for habit in &self.habits {
            let count = u64::from(habit.last_month_breaks(now));
            if count > 0 {
                ranking.insert_ranked(habit, count);
            } else {
                ranking.push(habit, 0);
            }
        }
        debug!(breaks = ?ranking.breaks, "Ranked by last month's breaks");
        Ok(ranking)
    }

    /// Oldest first. Habits whose creation date cannot be parsed come before all others.
    ///
    /// Among equal creation times the later habit comes first.
    pub fn sort_by_created_ascending(&mut self, refresh: bool) -> HabitResult<Vec<&Habit>> {
        self.prepare(refresh)?;
        let mut sorted: Vec<&Habit> = self.habits.iter().rev().collect();
        sorted.sort_by_key(|h| h.created_at().as_datetime());
        Ok(sorted)
    }

    /// Habits not yet satisfied for their current period.
    ///
    /// May repair unparseable check-ins in memory, see [`Habit::is_checked`].
    pub fn list_unchecked(&mut self, refresh: bool) -> HabitResult<Vec<&Habit>> {
        self.prepare(refresh)?;
        let now = self.now();

        let unchecked: Vec<HabitId> = self
            .habits
            .iter_mut()
            .filter_map(|h| (!h.is_checked(now)).then(|| h.id()))
            .collect();

        Ok(self
            .habits
            .iter()
            .filter(|h| unchecked.contains(&h.id()))
            .collect())
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    fn require_owner(&self) -> HabitResult<&OwnerId> {
        self.owner.as_ref().ok_or(HabitError::MissingOwner)
    }

    fn prepare(&mut self, refresh: bool) -> HabitResult<()> {
        self.require_owner()?;
        if refresh {
            self.reload()?;
        }
        Ok(())
    }

    fn find(&self, id: HabitId) -> HabitResult<&Habit> {
        self.habits
            .iter()
            .find(|h| h.id() == id)
            .ok_or(HabitError::NotFound(id))
    }

    fn parse_periodicity(&self, value: &str) -> HabitResult<Periodicity> {
        self.policy
            .codes
            .parse(value)
            .ok_or_else(|| HabitError::InvalidPeriodicity(value.to_string()))
    }

    /// Rebuild the list from the store. On failure the previous list is kept.
    fn reload(&mut self) -> HabitResult<()> {
        let owner = self.require_owner()?;
        let habits = self.load(owner)?;
        self.habits = habits;
        Ok(())
    }

    fn load(&self, owner: &OwnerId) -> HabitResult<Vec<Habit>> {
        let now = self.now();
        let habits = self
            .store
            .load_habits(owner)?
            .into_iter()
            .map(|record| Habit::from_record(record, &self.policy, now))
            .collect::<HabitResult<Vec<_>>>()?;

        debug!(owner = %owner, count = habits.len(), "Habits loaded");
        Ok(habits)
    }
}
