//! Strongly-typed identifiers for habitual

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage-assigned identifier of a habit record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HabitId(i64);

impl HabitId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for HabitId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for HabitId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Identifier of the person a habit belongs to. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OwnerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_id_equality() {
        let id1 = OwnerId::new("alice");
        let id2 = OwnerId::new("alice");
        let id3 = OwnerId::new("bob");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn habit_id_parses_from_cli_text() {
        assert_eq!(" 42 ".parse::<HabitId>().unwrap(), HabitId::new(42));
        assert!("forty-two".parse::<HabitId>().is_err());
    }

    #[test]
    fn ids_serialize_deserialize() {
        let owner = OwnerId::new("test-owner");
        let json = serde_json::to_string(&owner).unwrap();
        let parsed: OwnerId = serde_json::from_str(&json).unwrap();
        assert_eq!(owner, parsed);

        let habit_id = HabitId::new(7);
        let json = serde_json::to_string(&habit_id).unwrap();
        assert_eq!(json, "7");
    }
}
