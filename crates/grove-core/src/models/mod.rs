//! Data model for the capture pipeline

mod queue_entry;
mod record;
mod tag;

pub use queue_entry::{EntryId, QueueEntry};
pub use record::{DeviceMeta, FieldRecord, GpsFix};
pub use tag::{TagIdentifier, TAG_ID_PATTERN};
