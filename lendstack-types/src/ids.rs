//! Record identifiers.
//!
//! Ids are small positive integers issued per entity type by the sequence
//! allocator. In degraded mode they may be timestamp-derived and collide,
//! so nothing here assumes global uniqueness.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Identifier of a record within one entity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Wraps a raw integer id.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Reads an id out of a JSON value's `id` field.
    ///
    /// Accepts non-negative integers only; strings and floats are rejected
    /// so that a record with a malformed id never reaches the mirror.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        value.get("id").and_then(serde_json::Value::as_u64).map(Self)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| Error::InvalidRecordId(s.to_string()))
    }
}
