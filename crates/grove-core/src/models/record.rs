//! Field record model
//!
//! A `FieldRecord` is the unit of work entering the upload queue: one tag
//! read, optionally fused with a GPS fix, plus the caller-supplied domain
//! payload (tree name, species, health, garden, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::platform::TechKind;

use super::TagIdentifier;

/// A single GPS fix captured alongside a tag read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Horizontal accuracy in meters
    pub accuracy_m: f64,
    /// Altitude in meters, when the platform reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
}

/// Device context recorded with every capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    pub platform: String,
    pub os_version: String,
    pub app_version: String,
    /// Low-level technology the tag was actually read with
    pub technology_used: TechKind,
}

/// A validated-capture candidate headed for the upload queue.
///
/// `derived_id` is a pure function of `tag_id` and `collected_at_utc` is set
/// once at creation; neither is ever mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub tag_id: TagIdentifier,
    pub derived_id: String,
    /// GPS fix, when the capture mode requested one
    pub location: Option<GpsFix>,
    /// Capture timestamp (Unix ms, UTC)
    pub collected_at_utc: i64,
    /// Domain attributes supplied by the caller (steward, garden, species, ...)
    pub payload: JsonValue,
    pub device_meta: DeviceMeta,
    /// Detached signature over the signable bytes, when the device signs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl FieldRecord {
    /// Create a record for a fresh capture.
    ///
    /// Stamps `collected_at_utc` with the current time and derives
    /// `derived_id` from the tag.
    #[must_use]
    pub fn new(
        tag_id: TagIdentifier,
        location: Option<GpsFix>,
        payload: JsonValue,
        device_meta: DeviceMeta,
    ) -> Self {
        let derived_id = tag_id.derived_id();
        Self {
            tag_id,
            derived_id,
            location,
            collected_at_utc: chrono::Utc::now().timestamp_millis(),
            payload,
            device_meta,
            signature: None,
        }
    }

    /// Attach a detached signature produced by the device signer.
    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Canonical byte encoding of this record.
    ///
    /// This is the form the sink hashes for content addressing. serde_json
    /// is built without `preserve_order`, so object keys serialize sorted
    /// and the same record content always yields the same bytes.
    pub fn canonical_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// The bytes a signature covers: the record with the signature removed.
    pub fn signable_bytes(&self) -> crate::Result<Vec<u8>> {
        let mut unsigned = self.clone();
        unsigned.signature = None;
        unsigned.canonical_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn meta() -> DeviceMeta {
        DeviceMeta {
            platform: "android".to_string(),
            os_version: "14".to_string(),
            app_version: "1.4.2".to_string(),
            technology_used: TechKind::NfcA,
        }
    }

    fn tag() -> TagIdentifier {
        TagIdentifier::from_bytes(&[0x04, 0x5A, 0x2B, 0x8C]).unwrap()
    }

    #[test]
    fn test_new_derives_id_from_tag() {
        let record = FieldRecord::new(tag(), None, json!({}), meta());
        assert_eq!(record.derived_id, "TR-045A2B8C");
        assert!(record.collected_at_utc > 0);
        assert!(record.signature.is_none());
    }

    #[test]
    fn test_canonical_bytes_stable_across_key_order() {
        let mut a = FieldRecord::new(tag(), None, json!({"steward": "ada", "garden": "g-7"}), meta());
        let mut b = FieldRecord::new(tag(), None, json!({"garden": "g-7", "steward": "ada"}), meta());
        // Pin the timestamps so only payload key order differs
        a.collected_at_utc = 1_000;
        b.collected_at_utc = 1_000;
        assert_eq!(a.canonical_bytes().unwrap(), b.canonical_bytes().unwrap());
    }

    #[test]
    fn test_signable_bytes_exclude_signature() {
        let unsigned = FieldRecord::new(tag(), None, json!({}), meta());
        let signed = unsigned.clone().with_signature("sig-bytes");
        assert_eq!(
            unsigned.canonical_bytes().unwrap(),
            signed.signable_bytes().unwrap()
        );
        assert_ne!(
            signed.canonical_bytes().unwrap(),
            signed.signable_bytes().unwrap()
        );
    }

    #[test]
    fn test_record_roundtrips_through_json() {
        let record = FieldRecord::new(
            tag(),
            Some(GpsFix {
                lat: 23.5,
                lon: 120.9,
                accuracy_m: 4.2,
                altitude_m: None,
            }),
            json!({"steward": "ada"}),
            meta(),
        );
        let bytes = record.canonical_bytes().unwrap();
        let back: FieldRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(record, back);
    }
}
