//! Error types and handling
//!
//! The manager-level error type and its presentation form.

use crate::library::IoError;
use crate::recorder::playback::PlaybackError;
use crate::recorder::session::RecordingError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by every manager command
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Another operation is in progress, try again")]
    Busy,

    #[error("No async runtime available: {0}")]
    RuntimeUnavailable(String),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

impl ManagerError {
    /// Whether repeating the same call later can succeed without user action
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ManagerError::Busy | ManagerError::Recording(RecordingError::DeviceBusy)
        )
    }
}

/// Error response for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&ManagerError> for ErrorResponse {
    fn from(error: &ManagerError) -> Self {
        let code = match error {
            ManagerError::Busy => "BUSY",
            ManagerError::RuntimeUnavailable(_) => "RUNTIME_UNAVAILABLE",
            ManagerError::Io(IoError::Conflict(_)) => "NAME_CONFLICT",
            ManagerError::Io(IoError::InvalidName(_)) => "INVALID_NAME",
            ManagerError::Io(_) => "IO_ERROR",
            ManagerError::Recording(RecordingError::PermissionDenied) => "PERMISSION_DENIED",
            ManagerError::Recording(RecordingError::DeviceBusy) => "DEVICE_BUSY",
            ManagerError::Recording(_) => "RECORDING_ERROR",
            ManagerError::Playback(PlaybackError::SourceUnavailable(_)) => "SOURCE_UNAVAILABLE",
            ManagerError::Playback(_) => "PLAYBACK_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<ManagerError> for ErrorResponse {
    fn from(error: ManagerError) -> Self {
        ErrorResponse::from(&error)
    }
}

/// Result type alias using ManagerError
pub type ManagerResult<T> = Result<T, ManagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let busy = ErrorResponse::from(&ManagerError::Busy);
        assert_eq!(busy.code, "BUSY");
        assert_eq!(busy.message, "Another operation is in progress, try again");

        let denied = ErrorResponse::from(ManagerError::from(RecordingError::PermissionDenied));
        assert_eq!(denied.code, "PERMISSION_DENIED");
        assert_eq!(denied.message, "Permission not granted!");

        let conflict = ErrorResponse::from(ManagerError::from(IoError::Conflict("a".into())));
        assert_eq!(conflict.code, "NAME_CONFLICT");
        assert_eq!(conflict.message, "A recording named 'a' already exists");
    }

    #[test]
    fn test_retryable() {
        assert!(ManagerError::Busy.is_retryable());
        assert!(ManagerError::from(RecordingError::DeviceBusy).is_retryable());
        assert!(!ManagerError::from(RecordingError::PermissionDenied).is_retryable());
        assert!(!ManagerError::from(IoError::DeleteFailed("x".into())).is_retryable());
    }
}
