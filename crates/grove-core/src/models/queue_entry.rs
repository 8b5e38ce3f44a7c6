//! Queue entry model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::FieldRecord;

/// A unique identifier for a queue entry, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Create a new unique entry ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A field record wrapped with its delivery bookkeeping.
///
/// Created on enqueue; after that only the queue worker writes
/// `attempt_count` and `last_error`. An entry leaves the queue on a
/// confirmed upload or an explicit operator purge, never on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub record: FieldRecord,
    /// Enqueue timestamp (Unix ms, UTC); drain order is oldest-first
    pub enqueued_at: i64,
    pub attempt_count: u32,
    pub last_error: Option<String>,
}

impl QueueEntry {
    /// Wrap a record for the queue.
    #[must_use]
    pub fn new(record: FieldRecord) -> Self {
        Self {
            id: EntryId::new(),
            record,
            enqueued_at: chrono::Utc::now().timestamp_millis(),
            attempt_count: 0,
            last_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_unique() {
        let id1 = EntryId::new();
        let id2 = EntryId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_entry_id_parse() {
        let id = EntryId::new();
        let parsed: EntryId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
