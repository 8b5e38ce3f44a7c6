//! Record validation
//!
//! Pure, fail-fast checks a record must pass before it is eligible for the
//! upload queue. Validation never mutates the record and is never retried;
//! a rejected record means the caller must fix its input and resubmit.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::models::{FieldRecord, TAG_ID_PATTERN};
use crate::platform::SignatureVerifier;

/// Default freshness window: records older than this are not "fresh reads".
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Allowance for device clock skew before a future-dated record is rejected.
const FUTURE_SKEW_MS: i64 = 30_000;

/// Reasons a record fails validation, in check order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed tag id: {0}")]
    MalformedId(String),
    #[error("record is stale: collected {age_ms}ms ago")]
    StaleRecord { age_ms: i64 },
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("signature missing or invalid")]
    SignatureInvalid,
}

/// Validates field records against structural and freshness invariants.
pub struct RecordValidator {
    freshness_window: Duration,
    require_location: bool,
    required_fields: Vec<String>,
    verifier: Option<Arc<dyn SignatureVerifier>>,
    id_pattern: Regex,
}

impl RecordValidator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            require_location: false,
            required_fields: Vec::new(),
            verifier: None,
            id_pattern: Regex::new(TAG_ID_PATTERN).expect("Invalid regex"),
        }
    }

    /// Override the freshness window.
    #[must_use]
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Require a GPS fix on every record.
    #[must_use]
    pub const fn with_required_location(mut self) -> Self {
        self.require_location = true;
        self
    }

    /// Require a non-empty payload field (e.g. `steward`, `garden`).
    #[must_use]
    pub fn with_required_field(mut self, name: impl Into<String>) -> Self {
        self.required_fields.push(name.into());
        self
    }

    /// Configure a signature verifier; records must then carry a valid
    /// signature.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Validate against the current wall clock.
    pub fn validate(&self, record: &FieldRecord) -> Result<(), ValidationError> {
        self.validate_at(record, chrono::Utc::now().timestamp_millis())
    }

    /// Validate against an explicit "now" (Unix ms).
    pub fn validate_at(&self, record: &FieldRecord, now_ms: i64) -> Result<(), ValidationError> {
        self.check_tag_id(record)?;
        self.check_freshness(record, now_ms)?;
        self.check_required_fields(record)?;
        self.check_signature(record)?;
        Ok(())
    }

    fn check_tag_id(&self, record: &FieldRecord) -> Result<(), ValidationError> {
        let tag_id = record.tag_id.as_str();
        if !self.id_pattern.is_match(tag_id) {
            return Err(ValidationError::MalformedId(tag_id.to_string()));
        }
        // derived_id must be the pure function of tag_id, not caller-supplied
        if record.derived_id != record.tag_id.derived_id() {
            return Err(ValidationError::MalformedId(record.derived_id.clone()));
        }
        Ok(())
    }

    fn check_freshness(&self, record: &FieldRecord, now_ms: i64) -> Result<(), ValidationError> {
        let age_ms = now_ms - record.collected_at_utc;
        let window_ms = i64::try_from(self.freshness_window.as_millis()).unwrap_or(i64::MAX);
        if age_ms > window_ms || age_ms < -FUTURE_SKEW_MS {
            return Err(ValidationError::StaleRecord { age_ms });
        }
        Ok(())
    }

    fn check_required_fields(&self, record: &FieldRecord) -> Result<(), ValidationError> {
        if self.require_location && record.location.is_none() {
            return Err(ValidationError::MissingField("location".to_string()));
        }
        for name in &self.required_fields {
            if !has_value(&record.payload, name) {
                return Err(ValidationError::MissingField(name.clone()));
            }
        }
        Ok(())
    }

    fn check_signature(&self, record: &FieldRecord) -> Result<(), ValidationError> {
        let Some(verifier) = &self.verifier else {
            return Ok(());
        };
        let Some(signature) = &record.signature else {
            return Err(ValidationError::SignatureInvalid);
        };
        // A record that cannot be canonically encoded cannot be verified
        let bytes = record
            .signable_bytes()
            .map_err(|_| ValidationError::SignatureInvalid)?;
        if verifier.verify(&bytes, signature) {
            Ok(())
        } else {
            Err(ValidationError::SignatureInvalid)
        }
    }
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// A payload field counts as present when it is a non-empty string or any
/// other non-null value.
fn has_value(payload: &JsonValue, name: &str) -> bool {
    match payload.get(name) {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceMeta, GpsFix, TagIdentifier};
    use crate::platform::TechKind;
    use serde_json::json;

    fn record_at(collected_at_utc: i64) -> FieldRecord {
        let mut record = FieldRecord::new(
            TagIdentifier::from_bytes(&[0x04, 0x5A, 0x2B, 0x8C]).unwrap(),
            None,
            json!({"steward": "ada", "garden": "g-7"}),
            DeviceMeta {
                platform: "android".to_string(),
                os_version: "14".to_string(),
                app_version: "1.0.0".to_string(),
                technology_used: TechKind::NfcA,
            },
        );
        record.collected_at_utc = collected_at_utc;
        record
    }

    const NOW: i64 = 1_700_000_000_000;
    const MINUTE: i64 = 60_000;

    #[test]
    fn test_fresh_record_passes() {
        let validator = RecordValidator::new();
        let record = record_at(NOW - MINUTE);
        assert_eq!(validator.validate_at(&record, NOW), Ok(()));
    }

    #[test]
    fn test_ten_minute_old_record_is_stale() {
        let validator = RecordValidator::new();
        let record = record_at(NOW - 10 * MINUTE);
        assert_eq!(
            validator.validate_at(&record, NOW),
            Err(ValidationError::StaleRecord { age_ms: 10 * MINUTE })
        );
    }

    #[test]
    fn test_future_record_beyond_skew_is_stale() {
        let validator = RecordValidator::new();
        let record = record_at(NOW + MINUTE);
        assert!(matches!(
            validator.validate_at(&record, NOW),
            Err(ValidationError::StaleRecord { .. })
        ));
    }

    #[test]
    fn test_slight_future_skew_tolerated() {
        let validator = RecordValidator::new();
        let record = record_at(NOW + 10_000);
        assert_eq!(validator.validate_at(&record, NOW), Ok(()));
    }

    #[test]
    fn test_inconsistent_derived_id_is_malformed() {
        let validator = RecordValidator::new();
        let mut record = record_at(NOW);
        record.derived_id = "TR-FFFFFFFF".to_string();
        assert!(matches!(
            validator.validate_at(&record, NOW),
            Err(ValidationError::MalformedId(_))
        ));
    }

    #[test]
    fn test_missing_location_when_required() {
        let validator = RecordValidator::new().with_required_location();
        let record = record_at(NOW);
        assert_eq!(
            validator.validate_at(&record, NOW),
            Err(ValidationError::MissingField("location".to_string()))
        );

        let mut with_fix = record_at(NOW);
        with_fix.location = Some(GpsFix {
            lat: 23.5,
            lon: 120.9,
            accuracy_m: 5.0,
            altitude_m: None,
        });
        assert_eq!(validator.validate_at(&with_fix, NOW), Ok(()));
    }

    #[test]
    fn test_required_payload_fields() {
        let validator = RecordValidator::new()
            .with_required_field("steward")
            .with_required_field("plot");
        let record = record_at(NOW);
        assert_eq!(
            validator.validate_at(&record, NOW),
            Err(ValidationError::MissingField("plot".to_string()))
        );
    }

    #[test]
    fn test_whitespace_only_field_is_missing() {
        let validator = RecordValidator::new().with_required_field("garden");
        let mut record = record_at(NOW);
        record.payload = json!({"garden": "   "});
        assert_eq!(
            validator.validate_at(&record, NOW),
            Err(ValidationError::MissingField("garden".to_string()))
        );
    }

    #[test]
    fn test_fail_fast_order_id_before_staleness() {
        let validator = RecordValidator::new();
        let mut record = record_at(NOW - 10 * MINUTE);
        record.derived_id = "bogus".to_string();
        // Both checks would fail; the id check reports first
        assert!(matches!(
            validator.validate_at(&record, NOW),
            Err(ValidationError::MalformedId(_))
        ));
    }

    struct FixedVerifier {
        accept: bool,
    }

    impl SignatureVerifier for FixedVerifier {
        fn verify(&self, _signable_bytes: &[u8], _signature: &str) -> bool {
            self.accept
        }
    }

    #[test]
    fn test_signature_ignored_without_verifier() {
        let validator = RecordValidator::new();
        let record = record_at(NOW);
        assert_eq!(validator.validate_at(&record, NOW), Ok(()));
    }

    #[test]
    fn test_missing_signature_rejected_with_verifier() {
        let validator =
            RecordValidator::new().with_verifier(Arc::new(FixedVerifier { accept: true }));
        let record = record_at(NOW);
        assert_eq!(
            validator.validate_at(&record, NOW),
            Err(ValidationError::SignatureInvalid)
        );
    }

    #[test]
    fn test_signature_verdict_delegated() {
        let record = record_at(NOW).with_signature("sig");

        let accepting =
            RecordValidator::new().with_verifier(Arc::new(FixedVerifier { accept: true }));
        assert_eq!(accepting.validate_at(&record, NOW), Ok(()));

        let rejecting =
            RecordValidator::new().with_verifier(Arc::new(FixedVerifier { accept: false }));
        assert_eq!(
            rejecting.validate_at(&record, NOW),
            Err(ValidationError::SignatureInvalid)
        );
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let validator = RecordValidator::new().with_required_field("steward");
        let record = record_at(NOW);
        let before = record.clone();
        let _ = validator.validate_at(&record, NOW);
        assert_eq!(record, before);
    }
}
