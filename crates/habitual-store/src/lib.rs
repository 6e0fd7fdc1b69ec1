//! Persistence layer for habitual
//!
//! Provides:
//! - The `HabitStore` contract consumed by the habit collection
//! - Raw habit records, exactly as persisted
//! - SQLite backend with soft deletion
//! - In-memory backend for tests and throwaway sessions

mod memory;
mod record;
mod sqlite;
mod traits;

pub use memory::*;
pub use record::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
