//! Tag technology negotiation
//!
//! One negotiation is one pass over [`TECH_ORDER`]: try the primary
//! technology, fall straight through to the fallback on any failure, and
//! report the last failure if neither produced a uid. The technology handle
//! is released on every exit path, including cancellation; a held handle
//! blocks every subsequent read.

use std::time::Duration;

use crate::models::TagIdentifier;
use crate::platform::{Radio, TechError, TECH_ORDER};

use super::ReadError;

/// Releases the radio's technology handle when dropped.
///
/// Dropping the negotiation future mid-await (caller navigated away) runs
/// this too, so the handle can never be left dangling.
struct ReleaseGuard<'a> {
    radio: &'a dyn Radio,
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        self.radio.release_technology();
    }
}

impl From<TechError> for ReadError {
    fn from(error: TechError) -> Self {
        match error {
            TechError::Unavailable => Self::TechUnavailable,
            TechError::TagLost => Self::TagLost,
            TechError::NoUid => Self::NoUid,
        }
    }
}

/// Attempt one read against the radio, negotiating technologies in order.
pub(super) async fn negotiate(
    radio: &dyn Radio,
    timeout: Duration,
) -> Result<TagIdentifier, ReadError> {
    if !radio.is_enabled() {
        return Err(ReadError::RadioDisabled);
    }

    let mut last = ReadError::TechUnavailable;
    for kind in TECH_ORDER {
        let guard = ReleaseGuard { radio };
        let attempt = tokio::time::timeout(timeout, radio.request_technology(kind)).await;
        drop(guard);

        match attempt {
            Ok(Ok(bytes)) => match TagIdentifier::from_bytes(&bytes) {
                Some(uid) => {
                    tracing::debug!(%kind, %uid, "tag read");
                    return Ok(uid);
                }
                None => last = ReadError::NoUid,
            },
            Ok(Err(error)) => last = error.into(),
            Err(_elapsed) => last = ReadError::Timeout,
        }
        tracing::debug!(%kind, %last, "technology failed, trying next");
    }

    Err(last)
}
