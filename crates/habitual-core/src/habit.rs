//! Habit entity: load-time reconciliation and the check-in state machine

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use habitual_config::{CorruptCheckInPolicy, TrackingPolicy};
use habitual_store::HabitRecord;
use habitual_util::{HabitId, OwnerId, Periodicity, RecordedTime, last_month, start_of_day};
use tracing::{debug, warn};

use crate::{BreakHistory, HabitError, HabitResult};

/// Result of a check-in request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The current period was not yet satisfied; the streak advanced
    Checked,
    /// The current period was already satisfied; nothing changed
    AlreadySatisfied,
}

/// A recurring habit of one owner.
///
/// Constructing a habit from a stored record reconciles it against the
/// current moment: every whole period missed since the last interaction is
/// counted into the break history and resets the streak.
#[derive(Debug, Clone)]
pub struct Habit {
    id: HabitId,
    owner_id: OwnerId,
    title: String,
    description: String,
    periodicity: Periodicity,
    /// Code the periodicity was stored under
    periodicity_code: String,
    created_at: RecordedTime,
    last_checked: Option<RecordedTime>,
    last_break: Option<RecordedTime>,
    streak: u32,
    longest_streak: u32,
    break_history: BreakHistory,
    corrupt_last_checked: CorruptCheckInPolicy,
}

impl Habit {
    /// Build a habit from its stored record and reconcile it against `now`.
    ///
    /// Nothing is mutated unless reconciliation completes.
    pub fn from_record(
        record: HabitRecord,
        policy: &TrackingPolicy,
        now: NaiveDateTime,
    ) -> HabitResult<Self> {
        let id = record.id;
        let periodicity = policy
            .codes
            .parse(&record.periodicity)
            .ok_or_else(|| HabitError::InvalidPeriodicity(record.periodicity.clone()))?;

        let created_at = RecordedTime::parse(&record.created_at);
        let last_checked = record.last_checked.as_deref().map(RecordedTime::parse);
        let mut last_break = record.last_break.as_deref().map(RecordedTime::parse);

        let anchor = match last_checked.as_ref().and_then(RecordedTime::as_datetime) {
            Some(ts) => ts,
            None => {
                if let Some(RecordedTime::Unparseable(raw)) = &last_checked {
                    warn!(habit_id = %id, last_checked = %raw, "Unparseable last check-in, using creation date");
                }
                created_at
                    .as_datetime()
                    .ok_or(HabitError::UnparseableCreationDate { habit_id: id })?
            }
        };

        let previous_break = match &last_break {
            Some(RecordedTime::At(ts)) => Some(*ts),
            Some(RecordedTime::Unparseable(raw)) => {
                warn!(habit_id = %id, last_break = %raw, "Unparseable last break, ignoring it");
                None
            }
            None => None,
        };

        // A tie goes to the check-in; both land in the same day anyway
        let last_interaction = match previous_break {
            Some(ts) if start_of_day(ts) > start_of_day(anchor) => ts,
            _ => anchor,
        };

        let max_periods = policy.limits.max_periods(periodicity);
        let missed = missed_periods(periodicity, last_interaction, now, max_periods);
        if missed.len() >= max_periods as usize && max_periods > 0 {
            warn!(
                habit_id = %id,
                max_periods,
                "Reconciliation hit its iteration cap, older periods were not counted"
            );
        }

        let mut break_history = BreakHistory::parse_lenient(&record.break_history, id);
        let mut streak = record.streak;
        let longest_streak = record.longest_streak.max(record.streak);

        for day in &missed {
            break_history.record(*day);
        }
        if !missed.is_empty() {
            last_break = Some(RecordedTime::At(start_of_day(now) - Duration::days(1)));
            streak = 0;
        }

        debug!(
            habit_id = %id,
            periodicity = %periodicity,
            breaks = missed.len(),
            streak,
            "Habit reconciled"
        );

        Ok(Self {
            id,
            owner_id: record.owner_id,
            title: record.title,
            description: record.description,
            periodicity,
            periodicity_code: record.periodicity,
            created_at,
            last_checked,
            last_break,
            streak,
            longest_streak,
            break_history,
            corrupt_last_checked: policy.corrupt_last_checked,
        })
    }

    pub fn id(&self) -> HabitId {
        self.id
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    pub fn created_at(&self) -> &RecordedTime {
        &self.created_at
    }

    pub fn last_checked(&self) -> Option<&RecordedTime> {
        self.last_checked.as_ref()
    }

    pub fn last_break(&self) -> Option<&RecordedTime> {
        self.last_break.as_ref()
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    pub fn break_history(&self) -> &BreakHistory {
        &self.break_history
    }

    pub fn total_breaks(&self) -> u64 {
        self.break_history.total()
    }

    pub fn breaks_in(&self, year: i32, month: u32) -> u32 {
        self.break_history.in_month(year, month).unwrap_or(0)
    }

    /// Breaks recorded for the calendar month before `now`
    pub fn last_month_breaks(&self, now: NaiveDateTime) -> u32 {
        let month = last_month(now);
        self.breaks_in(month.year(), month.month())
    }

    pub fn set_title(&mut self, title: impl Into<String>, requester: &OwnerId) -> HabitResult<()> {
        self.ensure_owner(requester)?;
        self.title = title.into();
        Ok(())
    }

    pub fn set_description(
        &mut self,
        description: impl Into<String>,
        requester: &OwnerId,
    ) -> HabitResult<()> {
        self.ensure_owner(requester)?;
        self.description = description.into();
        Ok(())
    }

    /// Whether the current period is already satisfied.
    ///
    /// An unparseable last check-in is handled by the configured
    /// [`CorruptCheckInPolicy`], which may repair it in place.
    pub fn is_checked(&mut self, now: NaiveDateTime) -> bool {
        match &self.last_checked {
            None => false,
            Some(RecordedTime::At(ts)) => self.periodicity.same_period(*ts, now),
            Some(RecordedTime::Unparseable(raw)) => match self.corrupt_last_checked {
                CorruptCheckInPolicy::CreditAsChecked => {
                    warn!(
                        habit_id = %self.id,
                        last_checked = %raw,
                        "Unparseable last check-in, crediting the current period"
                    );
                    self.advance_streak(now);
                    true
                }
                CorruptCheckInPolicy::TreatAsUnchecked => {
                    warn!(
                        habit_id = %self.id,
                        last_checked = %raw,
                        "Unparseable last check-in, treating the current period as open"
                    );
                    false
                }
            },
        }
    }

    /// Check the habit off for the current period
    pub fn check(&mut self, requester: &OwnerId, now: NaiveDateTime) -> HabitResult<CheckOutcome> {
        self.ensure_owner(requester)?;

        if self.is_checked(now) {
            debug!(habit_id = %self.id, "Habit already satisfied for this period");
            return Ok(CheckOutcome::AlreadySatisfied);
        }

        self.advance_streak(now);
        debug!(habit_id = %self.id, streak = self.streak, "Habit checked");
        Ok(CheckOutcome::Checked)
    }

    /// Record for the store, reflecting reconciliation and any mutations
    pub fn to_record(&self) -> HabitRecord {
        HabitRecord {
            id: self.id,
            owner_id: self.owner_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            periodicity: self.periodicity_code.clone(),
            created_at: self.created_at.to_string(),
            last_break: self.last_break.as_ref().map(ToString::to_string),
            last_checked: self.last_checked.as_ref().map(ToString::to_string),
            streak: self.streak,
            longest_streak: self.longest_streak,
            break_history: self.break_history.to_json(),
        }
    }

    fn ensure_owner(&self, requester: &OwnerId) -> HabitResult<()> {
        if requester != &self.owner_id {
            warn!(habit_id = %self.id, requester = %requester, "Habit mutation by non-owner rejected");
            return Err(HabitError::PermissionDenied {
                habit_id: self.id,
                requester: requester.clone(),
            });
        }
        Ok(())
    }

    fn advance_streak(&mut self, now: NaiveDateTime) {
        self.last_checked = Some(RecordedTime::At(now));
        self.streak = self.streak.saturating_add(1);
        self.longest_streak = self.longest_streak.max(self.streak);
    }
}

/// Periods that passed without any interaction, oldest first.
///
/// The period containing `last_interaction` and the current period are never
/// counted. At most `max_periods` are returned.
pub fn missed_periods(
    periodicity: Periodicity,
    last_interaction: NaiveDateTime,
    now: NaiveDateTime,
    max_periods: u32,
) -> Vec<NaiveDate> {
    let current = periodicity.period_start(now);
    let mut cursor = periodicity.period_start(last_interaction) + periodicity.step();
    let mut missed = Vec::new();

    while cursor < current && missed.len() < max_periods as usize {
        missed.push(cursor.date());
        cursor += periodicity.step();
    }

    missed
}

#[cfg(test)]
mod tests {
    use super::*;
    use habitual_config::ReconcileLimits;
    use habitual_util::format_timestamp;

    /// Wednesday
    fn now() -> NaiveDateTime {
        at(2025, 6, 18, 10)
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn alice() -> OwnerId {
        OwnerId::new("alice")
    }

    fn record(periodicity: &str, created_at: NaiveDateTime) -> HabitRecord {
        HabitRecord {
            id: HabitId::new(7),
            owner_id: alice(),
            title: "stretch".into(),
            description: "ten minutes".into(),
            periodicity: periodicity.into(),
            created_at: format_timestamp(&created_at),
            last_break: None,
            last_checked: None,
            streak: 0,
            longest_streak: 0,
            break_history: "{}".into(),
        }
    }

    fn load(record: HabitRecord) -> Habit {
        Habit::from_record(record, &TrackingPolicy::default(), now()).unwrap()
    }

    #[test]
    fn daily_habit_never_checked_for_28_days() {
        let habit = load(record("0", at(2025, 5, 21, 9)));

        assert_eq!(habit.streak(), 0);
        assert_eq!(habit.total_breaks(), 27);
        assert_eq!(habit.breaks_in(2025, 5), 10);
        assert_eq!(habit.breaks_in(2025, 6), 17);
        assert_eq!(
            habit.last_break().and_then(RecordedTime::as_datetime),
            Some(at(2025, 6, 17, 0))
        );
    }

    #[test]
    fn weekly_habit_checked_three_weeks_ago() {
        let mut rec = record("1", at(2025, 5, 1, 9));
        rec.last_checked = Some(format_timestamp(&at(2025, 5, 28, 19)));
        rec.last_break = Some(format_timestamp(&at(2025, 5, 12, 0)));
        rec.streak = 4;
        rec.longest_streak = 4;

        let habit = load(rec);

        // Weeks of June 2nd and June 9th; the current week is still open
        assert_eq!(habit.total_breaks(), 2);
        assert_eq!(habit.breaks_in(2025, 6), 2);
        assert_eq!(habit.streak(), 0);
        assert_eq!(habit.longest_streak(), 4);
        // Yesterday, not the start of last week
        assert_eq!(
            habit.last_break().and_then(RecordedTime::as_datetime),
            Some(at(2025, 6, 17, 0))
        );
    }

    #[test]
    fn streak_saturates_instead_of_overflowing() {
        let mut rec = record("0", at(2025, 6, 1, 9));
        rec.last_checked = Some(format_timestamp(&at(2025, 6, 17, 9)));
        rec.streak = u32::MAX;
        rec.longest_streak = u32::MAX;

        let mut habit = load(rec);
        assert_eq!(habit.check(&alice(), now()).unwrap(), CheckOutcome::Checked);
        assert_eq!(habit.streak(), u32::MAX);
        assert_eq!(habit.longest_streak(), u32::MAX);
    }

    #[test]
    fn n_missed_periods_add_n_breaks() {
        for (code, step) in [("0", Duration::days(1)), ("1", Duration::weeks(1))] {
            for n in 0..30 {
                let mut rec = record(code, at(2019, 1, 7, 9));
                rec.last_checked = Some(format_timestamp(&(now() - step * (n + 1))));
                rec.break_history = r#"{"2019": {"2": 5}}"#.into();
                rec.streak = 6;
                rec.longest_streak = 6;

                let habit = load(rec);
                assert_eq!(habit.total_breaks(), 5 + n as u64, "code {} n {}", code, n);
                if n == 0 {
                    assert_eq!(habit.streak(), 6);
                    assert!(habit.last_break().is_none());
                } else {
                    assert_eq!(habit.streak(), 0);
                    assert_eq!(
                        habit.last_break().and_then(RecordedTime::as_datetime),
                        Some(at(2025, 6, 17, 0)),
                        "code {} n {}",
                        code,
                        n
                    );
                }
                assert_eq!(habit.longest_streak(), 6);
            }
        }
    }

    #[test]
    fn creation_period_is_a_trial() {
        let created_today = load(record("0", at(2025, 6, 18, 8)));
        assert_eq!(created_today.total_breaks(), 0);
        assert!(created_today.last_break().is_none());

        let created_yesterday = load(record("0", at(2025, 6, 17, 8)));
        assert_eq!(created_yesterday.total_breaks(), 0);

        let created_two_days_ago = load(record("0", at(2025, 6, 16, 8)));
        assert_eq!(created_two_days_ago.total_breaks(), 1);

        // Created last week, the first full week has not ended yet
        let weekly = load(record("1", at(2025, 6, 12, 8)));
        assert_eq!(weekly.total_breaks(), 0);
    }

    #[test]
    fn checked_day_zero_has_no_breaks() {
        let mut habit = load(record("0", at(2025, 6, 18, 8)));
        assert_eq!(habit.check(&alice(), now()).unwrap(), CheckOutcome::Checked);

        let tomorrow = at(2025, 6, 19, 7);
        let reloaded =
            Habit::from_record(habit.to_record(), &TrackingPolicy::default(), tomorrow).unwrap();
        assert_eq!(reloaded.total_breaks(), 0);
        assert_eq!(reloaded.streak(), 1);
    }

    #[test]
    fn check_is_idempotent_within_a_period() {
        let mut habit = load(record("1", at(2025, 6, 18, 8)));

        assert_eq!(habit.check(&alice(), now()).unwrap(), CheckOutcome::Checked);
        assert_eq!(habit.streak(), 1);

        // Later the same week
        let sunday = at(2025, 6, 22, 21);
        assert_eq!(habit.check(&alice(), sunday).unwrap(), CheckOutcome::AlreadySatisfied);
        assert_eq!(habit.streak(), 1);
        assert_eq!(habit.longest_streak(), 1);

        // Next Monday opens a new period
        let monday = at(2025, 6, 23, 6);
        assert!(!habit.is_checked(monday));
        assert_eq!(habit.check(&alice(), monday).unwrap(), CheckOutcome::Checked);
        assert_eq!(habit.streak(), 2);
    }

    #[test]
    fn check_by_another_owner_is_rejected() {
        let mut habit = load(record("0", at(2025, 6, 18, 8)));
        let result = habit.check(&OwnerId::new("bob"), now());

        assert!(matches!(result, Err(HabitError::PermissionDenied { .. })));
        assert_eq!(habit.streak(), 0);
        assert!(habit.last_checked().is_none());

        assert!(habit.set_title("hijacked", &OwnerId::new("bob")).is_err());
        assert_eq!(habit.title(), "stretch");
        habit.set_description("fifteen minutes", &alice()).unwrap();
        assert_eq!(habit.description(), "fifteen minutes");
    }

    #[test]
    fn reconciliation_is_idempotent_without_elapsed_time() {
        let first = load(record("0", at(2025, 5, 21, 9)));
        let second = load(first.to_record());

        assert_eq!(second.to_record(), first.to_record());
        assert_eq!(second.total_breaks(), 27);
    }

    #[test]
    fn reconciliation_resumes_after_last_break() {
        let mut rec = record("0", at(2025, 5, 1, 9));
        rec.last_checked = Some(format_timestamp(&at(2025, 6, 8, 9)));
        rec.last_break = Some(format_timestamp(&at(2025, 6, 16, 0)));
        rec.break_history = r#"{"2025": {"6": 7}}"#.into();

        let habit = load(rec);

        // Only June 17th is new
        assert_eq!(habit.breaks_in(2025, 6), 8);
    }

    #[test]
    fn corrupt_last_checked_is_credited() {
        let mut rec = record("0", at(2025, 6, 18, 8));
        rec.last_checked = Some("last tuesday".into());
        rec.streak = 2;
        rec.longest_streak = 2;

        let mut habit = load(rec);
        assert!(habit.is_checked(now()));
        assert_eq!(habit.streak(), 3);
        assert_eq!(habit.longest_streak(), 3);
        assert_eq!(habit.last_checked(), Some(&RecordedTime::At(now())));
    }

    #[test]
    fn corrupt_last_checked_can_be_left_open() {
        let mut rec = record("0", at(2025, 6, 18, 8));
        rec.last_checked = Some("last tuesday".into());
        rec.streak = 2;

        let policy = TrackingPolicy {
            corrupt_last_checked: CorruptCheckInPolicy::TreatAsUnchecked,
            ..TrackingPolicy::default()
        };
        let mut habit = Habit::from_record(rec, &policy, now()).unwrap();

        assert!(!habit.is_checked(now()));
        assert_eq!(habit.streak(), 2);
        assert_eq!(
            habit.last_checked(),
            Some(&RecordedTime::Unparseable("last tuesday".into()))
        );
    }

    #[test]
    fn iteration_cap_bounds_backfill() {
        let policy = TrackingPolicy {
            limits: ReconcileLimits {
                daily_max_periods: 5,
                weekly_max_periods: 2,
            },
            ..TrackingPolicy::default()
        };

        let daily = Habit::from_record(record("0", at(2000, 1, 1, 9)), &policy, now()).unwrap();
        assert_eq!(daily.total_breaks(), 5);
        assert_eq!(daily.breaks_in(2000, 1), 5);
        assert_eq!(daily.streak(), 0);

        let weekly = Habit::from_record(record("1", at(2000, 1, 1, 9)), &policy, now()).unwrap();
        assert_eq!(weekly.total_breaks(), 2);
    }

    #[test]
    fn default_cap_covers_ten_years_of_days() {
        let habit = load(record("0", at(2000, 1, 1, 9)));
        assert_eq!(habit.total_breaks(), 3650);
    }

    #[test]
    fn unknown_periodicity_is_fatal() {
        let result = Habit::from_record(record("2", now()), &TrackingPolicy::default(), now());
        assert!(matches!(result, Err(HabitError::InvalidPeriodicity(code)) if code == "2"));
    }

    #[test]
    fn unparseable_dates_are_fatal() {
        let mut rec = record("0", now());
        rec.created_at = "someday".into();
        let result = Habit::from_record(rec.clone(), &TrackingPolicy::default(), now());
        assert!(matches!(result, Err(HabitError::UnparseableCreationDate { .. })));

        rec.last_checked = Some("also broken".into());
        let result = Habit::from_record(rec.clone(), &TrackingPolicy::default(), now());
        assert!(matches!(result, Err(HabitError::UnparseableCreationDate { .. })));

        // A valid check-in rescues a broken creation date
        rec.last_checked = Some(format_timestamp(&at(2025, 6, 17, 9)));
        assert!(Habit::from_record(rec, &TrackingPolicy::default(), now()).is_ok());
    }

    #[test]
    fn unparseable_last_break_is_ignored() {
        let mut rec = record("0", at(2025, 6, 16, 8));
        rec.last_break = Some("broken".into());

        let habit = load(rec);
        assert_eq!(habit.total_breaks(), 1);
        assert_eq!(
            habit.last_break().and_then(RecordedTime::as_datetime),
            Some(at(2025, 6, 17, 0))
        );
    }

    #[test]
    fn longest_streak_never_trails_streak() {
        let mut rec = record("0", at(2025, 6, 18, 8));
        rec.streak = 5;
        rec.longest_streak = 3;

        let habit = load(rec);
        assert_eq!(habit.longest_streak(), 5);
    }

    #[test]
    fn last_month_breaks_reads_previous_month() {
        let habit = load(record("0", at(2025, 5, 21, 9)));
        assert_eq!(habit.last_month_breaks(now()), 10);
        assert_eq!(habit.last_month_breaks(at(2025, 8, 1, 9)), 0);
    }

    #[test]
    fn periodicity_names_are_accepted() {
        let habit = load(record("weekly", at(2025, 6, 18, 8)));
        assert_eq!(habit.periodicity(), Periodicity::Weekly);
        assert_eq!(habit.to_record().periodicity, "weekly");
    }

    #[test]
    fn missed_periods_are_monday_aligned() {
        // Thursday to the following Wednesday: no complete week in between
        let missed = missed_periods(Periodicity::Weekly, at(2025, 6, 12, 9), now(), 10);
        assert!(missed.is_empty());

        let missed = missed_periods(Periodicity::Weekly, at(2025, 5, 28, 9), now(), 10);
        assert_eq!(
            missed,
            vec![
                NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 9).unwrap(),
            ]
        );
    }
}
