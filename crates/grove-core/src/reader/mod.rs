//! Tag read orchestration
//!
//! [`TagReader`] wraps the technology negotiator in a bounded retry loop and
//! exposes the read lifecycle as an explicit state machine instead of a
//! bundle of reactive flags. At most one read is in flight at a time,
//! enforced by an atomic guard rather than a state check, so two callers
//! racing on `read()` can never start two negotiations.

mod negotiator;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::location::{self, LocationError};
use crate::models::{GpsFix, TagIdentifier};
use crate::platform::{LocationProvider, PermissionStatus, Radio};

/// Read lifecycle states.
///
/// `Checking` polls whether the radio is enabled; `NeedSettings` is terminal
/// until the caller acts on the settings deep-link and calls
/// [`TagReader::recheck`]. `Success` and `Error` both yield back to `Idle`
/// on the next read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Idle,
    Checking,
    NeedSettings,
    Reading,
    Success,
    Error,
}

/// Failures of the read pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("radio disabled")]
    RadioDisabled,
    #[error("no usable tag technology")]
    TechUnavailable,
    #[error("tag lost")]
    TagLost,
    #[error("tag read timed out")]
    Timeout,
    #[error("tag returned no uid")]
    NoUid,
    #[error("read failed after {attempts} attempts: {last}")]
    MaxRetriesExceeded { attempts: u32, last: Box<ReadError> },
    #[error(transparent)]
    Location(#[from] LocationError),
}

impl ReadError {
    /// The one user-facing message for this failure kind.
    ///
    /// Terminal states surface these, never a raw error string.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RadioDisabled => "NFC is turned off. Open settings to enable it.",
            Self::TechUnavailable => "This tag type is not supported.",
            Self::TagLost => "The tag moved away. Hold it still and try again.",
            Self::Timeout => "No tag found. Hold your phone against the tag.",
            Self::NoUid => "The tag did not report an identifier.",
            Self::MaxRetriesExceeded { last, .. } => last.user_message(),
            Self::Location(LocationError::PermissionDenied) => {
                "Location permission is required. Open settings to grant it."
            }
            Self::Location(LocationError::Unavailable) => "Could not determine your location.",
            Self::Location(LocationError::Timeout) => "Getting a GPS fix took too long.",
        }
    }
}

/// Outcome of a read request.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    /// The read completed and published its result
    Complete(T),
    /// Another read is in flight; this request was a no-op
    Busy,
    /// The radio (or a permanently denied permission) needs the settings
    /// screen before any read can proceed
    NeedSettings,
}

/// A tag read fused with the GPS fix captured alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedRead {
    pub uid: TagIdentifier,
    pub fix: GpsFix,
}

/// Tunables for the retry loop.
#[derive(Debug, Clone, Copy)]
pub struct ReadConfig {
    /// Negotiator attempts per read request
    pub attempts: u32,
    /// Fixed pause between attempts
    pub backoff: Duration,
    /// Timeout for one negotiator attempt and for the GPS fix
    pub timeout: Duration,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
struct Snapshot {
    state: ReadState,
    uid: Option<TagIdentifier>,
    message: Option<&'static str>,
}

/// The read-with-retry orchestrator.
pub struct TagReader {
    radio: Arc<dyn Radio>,
    config: ReadConfig,
    snapshot: Mutex<Snapshot>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a read request finishes or is cancelled.
///
/// If the request was abandoned while still `Reading`, the machine is put
/// back to `Idle` so cancellation can never leave it stuck.
struct FlightGuard<'a> {
    reader: &'a TagReader,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut snapshot) = self.reader.snapshot.lock() {
            if snapshot.state == ReadState::Reading {
                snapshot.state = ReadState::Idle;
            }
        }
        self.reader.in_flight.store(false, Ordering::SeqCst);
    }
}

impl TagReader {
    /// Create a reader and run the initial radio check.
    #[must_use]
    pub fn new(radio: Arc<dyn Radio>, config: ReadConfig) -> Self {
        let reader = Self {
            radio,
            config,
            snapshot: Mutex::new(Snapshot {
                state: ReadState::Checking,
                uid: None,
                message: None,
            }),
            in_flight: AtomicBool::new(false),
        };
        reader.recheck();
        reader
    }

    /// Re-poll the platform radio, e.g. after the user returns from settings.
    pub fn recheck(&self) {
        self.set_state(ReadState::Checking, None);
        if self.radio.is_enabled() {
            self.set_state(ReadState::Idle, None);
        } else {
            self.set_state(ReadState::NeedSettings, Some(ReadError::RadioDisabled.user_message()));
        }
    }

    /// Current state of the machine.
    pub fn state(&self) -> ReadState {
        self.snapshot.lock().map_or(ReadState::Error, |s| s.state)
    }

    /// The identifier published by the last successful read, if any.
    pub fn uid(&self) -> Option<TagIdentifier> {
        self.snapshot.lock().ok().and_then(|s| s.uid.clone())
    }

    /// The user-facing message for the current terminal state, if any.
    pub fn message(&self) -> Option<&'static str> {
        self.snapshot.lock().ok().and_then(|s| s.message)
    }

    /// Deep-link the user to the radio settings screen.
    pub fn open_radio_settings(&self) {
        self.radio.open_settings();
    }

    /// Read a tag, retrying up to the configured attempt budget.
    ///
    /// Single-flight: a call made while another read is in flight returns
    /// [`ReadOutcome::Busy`] immediately without touching the negotiator.
    /// `RadioDisabled` is never retried; it transitions the machine straight
    /// to `NeedSettings`.
    pub async fn read(&self) -> Result<ReadOutcome<TagIdentifier>, ReadError> {
        if !self.try_begin() {
            return Ok(ReadOutcome::Busy);
        }
        let _guard = FlightGuard { reader: self };

        match self.read_locked().await? {
            ReadOutcome::Complete(uid) => {
                self.publish_success(uid.clone());
                Ok(ReadOutcome::Complete(uid))
            }
            other => Ok(other),
        }
    }

    /// Read a tag and capture a GPS fix; completes only with both.
    ///
    /// Resolves location permission before the negotiator runs: asks once if
    /// the prompt is still available, deep-links to settings if the denial
    /// is permanent. A read that succeeds but then fails on the fix
    /// publishes no uid.
    pub async fn read_with_location(
        &self,
        provider: &dyn LocationProvider,
    ) -> Result<ReadOutcome<LocatedRead>, ReadError> {
        if !self.try_begin() {
            return Ok(ReadOutcome::Busy);
        }
        let _guard = FlightGuard { reader: self };

        match provider.check_permission() {
            PermissionStatus::Granted => {}
            PermissionStatus::Denied => {
                if !provider.request_permission().await {
                    return Err(self.fail(LocationError::PermissionDenied.into()));
                }
            }
            PermissionStatus::PermanentlyDenied => {
                provider.open_settings();
                self.set_state(
                    ReadState::NeedSettings,
                    Some(ReadError::Location(LocationError::PermissionDenied).user_message()),
                );
                return Ok(ReadOutcome::NeedSettings);
            }
        }

        let uid = match self.read_locked().await? {
            ReadOutcome::Complete(uid) => uid,
            ReadOutcome::Busy => return Ok(ReadOutcome::Busy),
            ReadOutcome::NeedSettings => return Ok(ReadOutcome::NeedSettings),
        };

        match location::capture(provider, self.config.timeout).await {
            Ok(fix) => {
                self.publish_success(uid.clone());
                Ok(ReadOutcome::Complete(LocatedRead { uid, fix }))
            }
            Err(error) => Err(self.fail(error.into())),
        }
    }

    /// The retry loop proper. Assumes the in-flight guard is held.
    async fn read_locked(&self) -> Result<ReadOutcome<TagIdentifier>, ReadError> {
        self.set_state(ReadState::Reading, None);

        let attempts = self.config.attempts.max(1);
        let mut last = ReadError::TechUnavailable;
        for attempt in 1..=attempts {
            match negotiator::negotiate(&*self.radio, self.config.timeout).await {
                Ok(uid) => {
                    tracing::info!(%uid, attempt, "tag read succeeded");
                    return Ok(ReadOutcome::Complete(uid));
                }
                Err(ReadError::RadioDisabled) => {
                    tracing::warn!("radio disabled, aborting read");
                    self.set_state(
                        ReadState::NeedSettings,
                        Some(ReadError::RadioDisabled.user_message()),
                    );
                    return Ok(ReadOutcome::NeedSettings);
                }
                Err(error) => {
                    tracing::debug!(%error, attempt, "read attempt failed");
                    last = error;
                    if attempt < attempts {
                        tokio::time::sleep(self.config.backoff).await;
                    }
                }
            }
        }

        Err(self.fail(ReadError::MaxRetriesExceeded {
            attempts,
            last: Box::new(last),
        }))
    }

    fn try_begin(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn publish_success(&self, uid: TagIdentifier) {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            snapshot.state = ReadState::Success;
            snapshot.uid = Some(uid);
            snapshot.message = None;
        }
    }

    fn fail(&self, error: ReadError) -> ReadError {
        self.set_state(ReadState::Error, Some(error.user_message()));
        error
    }

    fn set_state(&self, state: ReadState, message: Option<&'static str>) {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            snapshot.state = state;
            snapshot.message = message;
        }
    }
}
