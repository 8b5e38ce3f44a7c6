//! Queue entry repository implementation

use crate::error::{Error, Result};
use crate::models::{EntryId, FieldRecord, QueueEntry};
use rusqlite::{params, Connection};

/// A dead-lettered entry: permanently parked after exhausting its retry cap.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadEntry {
    pub entry: QueueEntry,
    /// When the entry was moved out of the live queue (Unix ms)
    pub dead_since: i64,
}

/// Trait for durable queue storage operations
///
/// The live queue is strictly FIFO: `oldest_first` is the drain order and
/// entries leave only through `remove` (confirmed upload), `dead_letter`
/// (capped retries), or `purge` (operator action).
pub trait QueueRepository {
    /// Append an entry to the live queue
    fn append(&self, entry: &QueueEntry) -> Result<()>;

    /// All live entries, oldest enqueue first
    fn oldest_first(&self) -> Result<Vec<QueueEntry>>;

    /// Remove an entry after a confirmed upload
    fn remove(&self, id: &EntryId) -> Result<()>;

    /// Record a failed attempt; returns the new attempt count
    fn record_failure(&self, id: &EntryId, error: &str) -> Result<u32>;

    /// Move an entry from the live queue to the dead-letter table
    fn dead_letter(&self, id: &EntryId, dead_since: i64) -> Result<()>;

    /// All dead-lettered entries, most recently parked first
    fn dead_letters(&self) -> Result<Vec<DeadEntry>>;

    /// Number of live entries
    fn pending_count(&self) -> Result<usize>;

    /// Remove every live entry; returns how many were dropped
    fn purge(&self) -> Result<usize>;
}

/// `SQLite` implementation of `QueueRepository`
pub struct SqliteQueueRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteQueueRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a queue entry from a database row
    fn parse_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, i64, u32, Option<String>)> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    }

    fn try_move_to_dead_letter(&self, id: &EntryId, dead_since: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO dead_letter (id, record, enqueued_at, attempt_count, last_error, dead_since)
             SELECT id, record, enqueued_at, attempt_count, last_error, ?2
             FROM upload_queue WHERE id = ?1",
            params![id.to_string(), dead_since],
        )?;
        let removed = self.conn.execute(
            "DELETE FROM upload_queue WHERE id = ?",
            params![id.to_string()],
        )?;
        if removed == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn build_entry(
        (id, record, enqueued_at, attempt_count, last_error): (String, String, i64, u32, Option<String>),
    ) -> Result<QueueEntry> {
        let id: EntryId = id
            .parse()
            .map_err(|_| Error::InvalidInput("Invalid entry ID in store".into()))?;
        let record: FieldRecord = serde_json::from_str(&record)?;
        Ok(QueueEntry {
            id,
            record,
            enqueued_at,
            attempt_count,
            last_error,
        })
    }
}

impl QueueRepository for SqliteQueueRepository<'_> {
    fn append(&self, entry: &QueueEntry) -> Result<()> {
        let record = serde_json::to_string(&entry.record)?;
        self.conn.execute(
            "INSERT INTO upload_queue (id, record, enqueued_at, attempt_count, last_error)
             VALUES (?, ?, ?, ?, ?)",
            params![
                entry.id.to_string(),
                record,
                entry.enqueued_at,
                entry.attempt_count,
                entry.last_error
            ],
        )?;
        Ok(())
    }

    fn oldest_first(&self) -> Result<Vec<QueueEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, record, enqueued_at, attempt_count, last_error
             FROM upload_queue
             ORDER BY enqueued_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([], Self::parse_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(Self::build_entry(row?)?);
        }
        Ok(entries)
    }

    fn remove(&self, id: &EntryId) -> Result<()> {
        let affected = self.conn.execute(
            "DELETE FROM upload_queue WHERE id = ?",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn record_failure(&self, id: &EntryId, error: &str) -> Result<u32> {
        let affected = self.conn.execute(
            "UPDATE upload_queue
             SET attempt_count = attempt_count + 1, last_error = ?
             WHERE id = ?",
            params![error, id.to_string()],
        )?;
        if affected == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        let count: u32 = self.conn.query_row(
            "SELECT attempt_count FROM upload_queue WHERE id = ?",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn dead_letter(&self, id: &EntryId, dead_since: i64) -> Result<()> {
        // Copy and delete must commit together: a crash between them would
        // leave the entry in both tables, and the next move for that id
        // must then treat the existing copy as already parked.
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        let moved = self.try_move_to_dead_letter(id, dead_since);
        match &moved {
            Ok(()) => self.conn.execute_batch("COMMIT")?,
            Err(_) => {
                let _ = self.conn.execute_batch("ROLLBACK");
            }
        }
        moved
    }

    fn dead_letters(&self) -> Result<Vec<DeadEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, record, enqueued_at, attempt_count, last_error, dead_since
             FROM dead_letter
             ORDER BY dead_since DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((Self::parse_entry(row)?, row.get::<_, i64>(5)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (raw, dead_since) = row?;
            entries.push(DeadEntry {
                entry: Self::build_entry(raw)?,
                dead_since,
            });
        }
        Ok(entries)
    }

    fn pending_count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM upload_queue", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn purge(&self) -> Result<usize> {
        let dropped = self.conn.execute("DELETE FROM upload_queue", [])?;
        Ok(dropped)
    }
}
