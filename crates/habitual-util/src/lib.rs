//! Shared utilities for habitual
//!
//! This crate provides:
//! - Calendar math (start of day/week, last month, timestamp parsing)
//! - Habit periodicity (daily or Monday-aligned weekly)
//! - ID types (HabitId, OwnerId)
//! - An injectable clock
//! - Default paths for config and data directories

mod calendar;
mod clock;
mod ids;
mod paths;
mod periodicity;

pub use calendar::*;
pub use clock::*;
pub use ids::*;
pub use paths::*;
pub use periodicity::*;
