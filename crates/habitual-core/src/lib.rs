//! Habit engine for habitual
//!
//! This crate is the heart of habitual, containing:
//! - Load-time reconciliation (backfilling missed days or weeks into break history)
//! - The per-period check-in state machine with ownership checks
//! - The per-owner habit collection: mutate-then-reload, filters, sorts and rankings
//! - Demo habits to seed an empty store

mod collection;
mod demo;
mod error;
mod habit;
mod history;

pub use collection::*;
pub use demo::*;
pub use error::*;
pub use habit::*;
pub use history::*;
