//! Durable, at-least-once upload queue
//!
//! `enqueue` appends a record to the SQLite-backed store and returns as soon
//! as the write is durable; it never touches the network. `drain` replays
//! the queue oldest-first against the sink and stops at the first failure,
//! so a sink that is down is hit once per cycle, not once per entry.
//!
//! Delivery is at-least-once: a crash between a confirmed upload and the
//! entry's removal replays that upload on the next drain. That is safe
//! because the sink contract is content-addressed; the replay lands on the
//! same content id.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::db::{Database, DeadEntry, QueueRepository, SqliteQueueRepository};
use crate::error::{Error, Result};
use crate::models::{EntryId, FieldRecord, QueueEntry};
use crate::platform::{ContentId, UploadSink};

/// Queue tunables.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueConfig {
    /// Retry cap before an entry is parked in the dead-letter table.
    ///
    /// `None` retries forever on every drain, which is how the queue
    /// behaves by default; a cap keeps a permanently-rejected record from
    /// blocking the head of the queue indefinitely.
    pub max_attempts: Option<u32>,
}

/// Result of one drain request.
#[derive(Debug, Clone, PartialEq)]
pub enum DrainOutcome {
    /// Another drain cycle was already running; this request was a no-op
    AlreadyDraining,
    /// A cycle ran (possibly over an empty queue)
    Drained(DrainReport),
}

/// What one drain cycle did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrainReport {
    /// Entries confirmed by the sink, with their content ids
    pub uploaded: Vec<(EntryId, ContentId)>,
    /// The failure that stopped the cycle, if any
    pub failed: Option<(EntryId, String)>,
    /// Entries parked in the dead-letter table this cycle
    pub dead_lettered: Vec<EntryId>,
}

/// Per-entry view for the status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryStatus {
    pub id: String,
    pub derived_id: String,
    pub enqueued_at: i64,
    pub attempt_count: u32,
    pub last_error: Option<String>,
}

/// Snapshot of the queue for callers polling eventual delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub pending: usize,
    pub dead_lettered: usize,
    pub oldest_enqueued_at: Option<i64>,
    pub entries: Vec<EntryStatus>,
}

/// The durable upload queue.
pub struct UploadQueue {
    db: Mutex<Database>,
    config: QueueConfig,
    drain_gate: tokio::sync::Mutex<()>,
}

impl UploadQueue {
    #[must_use]
    pub fn new(db: Database, config: QueueConfig) -> Self {
        Self {
            db: Mutex::new(db),
            config,
            drain_gate: tokio::sync::Mutex::new(()),
        }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| Error::InvalidInput("queue database lock poisoned".into()))
    }

    /// Accept a validated record.
    ///
    /// The entry is written to durable storage before this returns; the
    /// upload attempt happens later, in [`Self::drain`]. Producers only
    /// ever observe "enqueued".
    pub fn enqueue(&self, record: FieldRecord) -> Result<QueueEntry> {
        let entry = QueueEntry::new(record);
        {
            let db = self.db()?;
            SqliteQueueRepository::new(db.connection()).append(&entry)?;
        }
        tracing::debug!(id = %entry.id, derived_id = %entry.record.derived_id, "record enqueued");
        Ok(entry)
    }

    /// Replay pending entries against the sink, oldest first.
    ///
    /// Stops at the first failing entry to preserve order and to avoid
    /// hammering a sink that is currently down. Safe to call on every
    /// connectivity-restored event; an empty queue is a no-op, and a drain
    /// requested while one is running coalesces into
    /// [`DrainOutcome::AlreadyDraining`].
    pub async fn drain(&self, sink: &dyn UploadSink) -> Result<DrainOutcome> {
        let Ok(_gate) = self.drain_gate.try_lock() else {
            tracing::debug!("drain already in progress, coalescing");
            return Ok(DrainOutcome::AlreadyDraining);
        };

        let entries = {
            let db = self.db()?;
            SqliteQueueRepository::new(db.connection()).oldest_first()?
        };

        let mut report = DrainReport::default();
        for entry in entries {
            match sink.upload(&entry.record).await {
                Ok(content_id) => {
                    let db = self.db()?;
                    SqliteQueueRepository::new(db.connection()).remove(&entry.id)?;
                    tracing::info!(id = %entry.id, %content_id, "record uploaded");
                    report.uploaded.push((entry.id, content_id));
                }
                Err(error) => {
                    let db = self.db()?;
                    let repo = SqliteQueueRepository::new(db.connection());
                    let attempts = repo.record_failure(&entry.id, &error.to_string())?;
                    tracing::warn!(id = %entry.id, attempts, %error, "upload failed, stopping drain");

                    if self.config.max_attempts.is_some_and(|cap| attempts >= cap) {
                        repo.dead_letter(&entry.id, chrono::Utc::now().timestamp_millis())?;
                        tracing::warn!(id = %entry.id, attempts, "entry dead-lettered");
                        report.dead_lettered.push(entry.id);
                    }

                    report.failed = Some((entry.id, error.to_string()));
                    break;
                }
            }
        }

        Ok(DrainOutcome::Drained(report))
    }

    /// Live entries, in drain order.
    pub fn entries(&self) -> Result<Vec<QueueEntry>> {
        let db = self.db()?;
        SqliteQueueRepository::new(db.connection()).oldest_first()
    }

    /// Entries parked after exhausting their retry cap.
    pub fn dead_letters(&self) -> Result<Vec<DeadEntry>> {
        let db = self.db()?;
        SqliteQueueRepository::new(db.connection()).dead_letters()
    }

    /// Status snapshot: the only way callers observe eventual delivery.
    pub fn status(&self) -> Result<QueueStatus> {
        let db = self.db()?;
        let repo = SqliteQueueRepository::new(db.connection());
        let entries = repo.oldest_first()?;
        let dead_lettered = repo.dead_letters()?.len();
        Ok(QueueStatus {
            pending: entries.len(),
            dead_lettered,
            oldest_enqueued_at: entries.first().map(|entry| entry.enqueued_at),
            entries: entries
                .into_iter()
                .map(|entry| EntryStatus {
                    id: entry.id.to_string(),
                    derived_id: entry.record.derived_id,
                    enqueued_at: entry.enqueued_at,
                    attempt_count: entry.attempt_count,
                    last_error: entry.last_error,
                })
                .collect(),
        })
    }

    /// Drop every live entry. Operator action; nothing else removes an
    /// unsent record.
    pub fn purge(&self) -> Result<usize> {
        let db = self.db()?;
        let dropped = SqliteQueueRepository::new(db.connection()).purge()?;
        tracing::info!(dropped, "queue purged");
        Ok(dropped)
    }
}
