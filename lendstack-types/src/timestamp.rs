//! Creation and modification timestamps shared by all records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `createdAt`/`updatedAt` pair.
///
/// Serialized as RFC 3339 strings under camelCase keys so that it can be
/// flattened into any record's JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Both timestamps set to the current time.
    #[must_use]
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// Both timestamps set to `instant`.
    #[must_use]
    pub const fn at(instant: DateTime<Utc>) -> Self {
        Self {
            created_at: instant,
            updated_at: instant,
        }
    }

    /// Advances `updated_at` to now, never moving it backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::now()
    }
}
