//! Platform capabilities the pipeline depends on
//!
//! The core never talks to a real radio, GPS chip, or network. It depends on
//! the narrow traits here; each client platform supplies implementations,
//! and tests substitute fakes.

mod sink;

pub use sink::{ContentId, FsContentSink, MemorySink, SinkError, UploadSink};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::LocationError;
use crate::models::GpsFix;

/// Low-level tag technologies, in negotiation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TechKind {
    /// Primary technology (plain NFC-A uid read)
    NfcA,
    /// Fallback for tags that only expose ISO-DEP
    IsoDep,
}

/// Negotiation order: primary first, then fallback.
pub const TECH_ORDER: [TechKind; 2] = [TechKind::NfcA, TechKind::IsoDep];

impl std::fmt::Display for TechKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NfcA => write!(f, "nfc-a"),
            Self::IsoDep => write!(f, "iso-dep"),
        }
    }
}

/// Failures a single technology request can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TechError {
    #[error("technology not usable on this tag")]
    Unavailable,
    #[error("tag left the field during the read")]
    TagLost,
    #[error("tag responded without a uid")]
    NoUid,
}

/// The device radio, as exposed by the platform shell.
#[async_trait]
pub trait Radio: Send + Sync {
    /// Whether the radio is switched on at the platform level.
    fn is_enabled(&self) -> bool;

    /// Deep-link the user to the platform radio settings.
    fn open_settings(&self);

    /// Request one technology against the tag in the field and return its
    /// raw uid bytes. May suspend until a tag arrives; the caller imposes
    /// the timeout.
    async fn request_technology(&self, kind: TechKind) -> Result<Vec<u8>, TechError>;

    /// Release the currently held technology handle.
    ///
    /// Must be safe to call when nothing is held; the negotiator calls it
    /// unconditionally, including on cancellation.
    fn release_technology(&self);
}

/// Location permission state as the platform reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    /// Denied, but the platform will still show the permission prompt
    Denied,
    /// Denied with "don't ask again"; only the settings screen can fix it
    PermanentlyDenied,
}

/// The platform location service.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    fn check_permission(&self) -> PermissionStatus;

    /// Show the permission prompt once; true when the user granted it.
    async fn request_permission(&self) -> bool;

    /// Deep-link the user to the app's location settings.
    fn open_settings(&self);

    /// Acquire a single fix. The caller imposes the timeout.
    async fn get_fix(&self) -> Result<GpsFix, LocationError>;
}

/// Pluggable verifier for device-signed records.
///
/// Grove does not implement signature cryptography; this is the hook point
/// the validator delegates to when a verifier is configured.
pub trait SignatureVerifier: Send + Sync {
    /// Verify `signature` over the record's signable bytes.
    fn verify(&self, signable_bytes: &[u8], signature: &str) -> bool;
}
