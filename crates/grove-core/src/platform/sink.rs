//! Upload sink trait and the bundled content-addressed stores.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::FieldRecord;

/// Identifier returned by a content-addressed sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId(String);

impl ContentId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failures an upload attempt can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The sink could not be reached (offline, endpoint down)
    #[error("sink unreachable: {0}")]
    Unreachable(String),
    /// The sink answered and refused the record
    #[error("sink rejected record: {0}")]
    Rejected(String),
}

/// An external store that accepts a validated record.
///
/// Contract: the returned id is a deterministic function of the record's
/// canonical bytes (same content, same id). That is what makes the queue's
/// at-least-once delivery safe; a replayed upload after a crash lands on the
/// identical id and has no downstream side effect.
#[async_trait]
pub trait UploadSink: Send + Sync {
    async fn upload(&self, record: &FieldRecord) -> Result<ContentId, SinkError>;
}

/// Content id for a canonical byte encoding: `sha256:<hex digest>`.
fn content_id_for(bytes: &[u8]) -> ContentId {
    let digest = Sha256::digest(bytes);
    let hex = digest
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    ContentId(format!("sha256:{hex}"))
}

fn canonical_or_rejected(record: &FieldRecord) -> Result<Vec<u8>, SinkError> {
    record
        .canonical_bytes()
        .map_err(|error| SinkError::Rejected(error.to_string()))
}

/// In-memory content-addressed store for tests and dry runs.
#[derive(Default)]
pub struct MemorySink {
    objects: Mutex<HashMap<ContentId, Vec<u8>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct objects stored
    pub fn len(&self) -> usize {
        self.objects.lock().map_or(0, |objects| objects.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.objects
            .lock()
            .is_ok_and(|objects| objects.contains_key(id))
    }
}

#[async_trait]
impl UploadSink for MemorySink {
    async fn upload(&self, record: &FieldRecord) -> Result<ContentId, SinkError> {
        let bytes = canonical_or_rejected(record)?;
        let id = content_id_for(&bytes);
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| SinkError::Unreachable("store lock poisoned".to_string()))?;
        objects.insert(id.clone(), bytes);
        Ok(id)
    }
}

/// Directory-backed content-addressed store.
///
/// Writes each record's canonical bytes to `<digest>.json` under the root.
/// Uploading identical content twice overwrites the file with the same
/// bytes, so replays are harmless.
pub struct FsContentSink {
    root: PathBuf,
}

impl FsContentSink {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> crate::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Path an id's object lives at.
    #[must_use]
    pub fn object_path(&self, id: &ContentId) -> PathBuf {
        // sha256:<hex> -> <hex>.json
        let name = id.as_str().replace(':', "-");
        self.root.join(format!("{name}.json"))
    }
}

#[async_trait]
impl UploadSink for FsContentSink {
    async fn upload(&self, record: &FieldRecord) -> Result<ContentId, SinkError> {
        let bytes = canonical_or_rejected(record)?;
        let id = content_id_for(&bytes);
        let path = self.object_path(&id);
        std::fs::write(&path, &bytes)
            .map_err(|error| SinkError::Unreachable(format!("{}: {error}", path.display())))?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceMeta, TagIdentifier};
    use crate::platform::TechKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record() -> FieldRecord {
        FieldRecord::new(
            TagIdentifier::from_bytes(&[0x04, 0x5A]).unwrap(),
            None,
            json!({"steward": "ada"}),
            DeviceMeta {
                platform: "android".to_string(),
                os_version: "14".to_string(),
                app_version: "1.0.0".to_string(),
                technology_used: TechKind::NfcA,
            },
        )
    }

    #[tokio::test]
    async fn test_memory_sink_same_content_same_id() {
        let sink = MemorySink::new();
        let record = record();

        let first = sink.upload(&record).await.unwrap();
        let second = sink.upload(&record).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(sink.len(), 1);
        assert!(first.as_str().starts_with("sha256:"));
    }

    #[tokio::test]
    async fn test_memory_sink_different_content_different_id() {
        let sink = MemorySink::new();
        let mut one = record();
        one.collected_at_utc = 1_000;
        let mut other = record();
        other.collected_at_utc = 2_000;

        let a = sink.upload(&one).await.unwrap();
        let b = sink.upload(&other).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_fs_sink_writes_object_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsContentSink::new(dir.path()).unwrap();
        let record = record();

        let id = sink.upload(&record).await.unwrap();
        let path = sink.object_path(&id);
        assert!(path.exists());

        let bytes = std::fs::read(path).unwrap();
        assert_eq!(bytes, record.canonical_bytes().unwrap());
    }
}
