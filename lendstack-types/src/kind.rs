//! The closed set of entity types.
//!
//! Every derived name (type name, storage key, remote table) is computed
//! here so that the store, the allocator and the mirror all agree on the
//! namespacing of a type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A logical domain object category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Enquiry,
    Document,
    Staff,
    Transaction,
    Notification,
}

impl EntityKind {
    /// All entity types, in reporting order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Enquiry,
        EntityKind::Document,
        EntityKind::Staff,
        EntityKind::Transaction,
        EntityKind::Notification,
    ];

    /// Singular lowercase name, used in logs, URLs and counter keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Enquiry => "enquiry",
            EntityKind::Document => "document",
            EntityKind::Staff => "staff",
            EntityKind::Transaction => "transaction",
            EntityKind::Notification => "notification",
        }
    }

    /// Key under which the repository list is persisted (`<key>.json` on disk).
    #[must_use]
    pub const fn storage_key(&self) -> &'static str {
        match self {
            EntityKind::Enquiry => "enquiries",
            EntityKind::Document => "documents",
            EntityKind::Staff => "staff",
            EntityKind::Transaction => "transactions",
            EntityKind::Notification => "notifications",
        }
    }

    /// Remote Mirror table name. Matches the storage key.
    #[must_use]
    pub const fn remote_table(&self) -> &'static str {
        self.storage_key()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    /// Accepts the singular name or the plural storage key, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle || kind.storage_key() == needle)
            .ok_or_else(|| Error::UnknownEntityKind(s.to_string()))
    }
}
