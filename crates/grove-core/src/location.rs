//! Single-shot GPS fix capture
//!
//! Deliberately retry-free: tag-read retries live in the reader, and a flaky
//! fix must not multiply tag attempts. Callers that want another fix call
//! `capture` again.

use std::time::Duration;

use thiserror::Error;

use crate::models::GpsFix;
use crate::platform::LocationProvider;

/// Failures of the location capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable")]
    Unavailable,
    #[error("location fix timed out")]
    Timeout,
}

/// Capture one GPS fix within `timeout`.
pub async fn capture(
    provider: &dyn LocationProvider,
    timeout: Duration,
) -> Result<GpsFix, LocationError> {
    match tokio::time::timeout(timeout, provider.get_fix()).await {
        Ok(result) => result,
        Err(_elapsed) => {
            tracing::debug!(?timeout, "gps fix timed out");
            Err(LocationError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PermissionStatus;
    use async_trait::async_trait;

    struct StubProvider {
        fix: Result<GpsFix, LocationError>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl LocationProvider for StubProvider {
        fn check_permission(&self) -> PermissionStatus {
            PermissionStatus::Granted
        }

        async fn request_permission(&self) -> bool {
            true
        }

        fn open_settings(&self) {}

        async fn get_fix(&self) -> Result<GpsFix, LocationError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.fix.clone()
        }
    }

    #[tokio::test]
    async fn test_capture_returns_fix() {
        let provider = StubProvider {
            fix: Ok(GpsFix {
                lat: 23.5,
                lon: 120.9,
                accuracy_m: 3.0,
                altitude_m: Some(120.0),
            }),
            delay: None,
        };

        let fix = capture(&provider, Duration::from_secs(1)).await.unwrap();
        assert!((fix.lat - 23.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_capture_times_out() {
        let provider = StubProvider {
            fix: Err(LocationError::Unavailable),
            delay: Some(Duration::from_secs(30)),
        };

        tokio::time::pause();
        let result = capture(&provider, Duration::from_secs(1)).await;
        assert_eq!(result, Err(LocationError::Timeout));
    }

    #[tokio::test]
    async fn test_capture_propagates_provider_error() {
        let provider = StubProvider {
            fix: Err(LocationError::Unavailable),
            delay: None,
        };

        let result = capture(&provider, Duration::from_secs(1)).await;
        assert_eq!(result, Err(LocationError::Unavailable));
    }
}
