//! Habit engine errors

use habitual_store::StoreError;
use habitual_util::{HabitId, OwnerId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HabitError {
    #[error("Unknown periodicity: '{0}'")]
    InvalidPeriodicity(String),

    #[error("Habit {habit_id} has no parseable last check-in or creation date")]
    UnparseableCreationDate { habit_id: HabitId },

    #[error("Habit {habit_id} does not belong to {requester}")]
    PermissionDenied { habit_id: HabitId, requester: OwnerId },

    #[error("No habit with id {0}")]
    NotFound(HabitId),

    #[error("No owner selected")]
    MissingOwner,

    #[error("Habit title must not be empty")]
    EmptyTitle,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type HabitResult<T> = Result<T, HabitError>;
