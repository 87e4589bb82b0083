use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from mihrab operations.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum MihrabError {
    /// Device location denied, timed out or unsupported.
    /// Recovered locally by falling back to Mecca.
    #[error("Location unavailable: {reason}")]
    LocationUnavailable { reason: String },

    /// Reverse geocoding failed. Non-fatal, the label degrades to raw coordinates.
    #[error("Reverse geocoding failed: {0}")]
    GeocodeFailed(String),

    /// Every transport candidate was tried and none produced a valid record.
    #[error("Prayer times unavailable after {attempts} attempts: {last_error}")]
    PrayerTimeUnavailable { attempts: usize, last_error: String },

    /// Provider payload is structurally incomplete.
    #[error("Invalid prayer payload: {0}")]
    InvalidPrayerPayload(String),

    /// Latitude or longitude outside the valid range.
    #[error("Invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// A time-of-day string that is not `HH:MM`.
    #[error("Invalid time of day: {0:?}")]
    InvalidTime(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Durable storage could not be read or written.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Low-level HTTP failure outside the prayer-time transport chain.
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl MihrabError {
    /// Creates a `LocationUnavailable` error.
    pub fn location_unavailable(reason: impl Into<String>) -> Self {
        Self::LocationUnavailable { reason: reason.into() }
    }

    /// Creates an `InvalidConfiguration` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { reason: reason.into() }
    }

    /// Creates a `PrayerTimeUnavailable` error carrying the last recorded failure.
    pub fn prayer_time_unavailable(attempts: usize, last_error: impl Into<String>) -> Self {
        Self::PrayerTimeUnavailable { attempts, last_error: last_error.into() }
    }

    /// True for errors that should be shown to the user with a retry action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PrayerTimeUnavailable { .. } | Self::NetworkError(_) | Self::LocationUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message_carries_last_error() {
        let err = MihrabError::prayer_time_unavailable(4, "Request timeout: API took too long to respond");
        let msg = err.to_string();
        assert!(msg.contains("4 attempts"));
        assert!(msg.contains("took too long"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_payload_error_not_retryable() {
        assert!(!MihrabError::InvalidPrayerPayload("missing Isha".into()).is_retryable());
    }
}
