//! Guestbook entry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted guestbook entry.
///
/// Serialized with camelCase keys: `id`, `name`, `content`, `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Assigned by storage, never changes afterwards
    pub id: i64,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// An entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub name: String,
    pub content: String,
    /// Falls back to the time of the save when `None`
    pub created_at: Option<DateTime<Utc>>,
}

impl NewEntry {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Attach an id, resolving a missing timestamp to `now`.
    pub(crate) fn into_entry(self, id: i64, now: DateTime<Utc>) -> Entry {
        Entry {
            id,
            name: self.name,
            content: self.content,
            created_at: self.created_at.unwrap_or(now),
        }
    }
}
