//! Session state and manager events
//!
//! Defines the recording/playback state machines, the snapshot handed to
//! the presentation layer, and the events the manager broadcasts.

use crate::library::Recording;
use crate::utils::error::{ErrorResponse, ManagerError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of the capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// No capture in progress
    Idle,
    /// Capturing to the target file
    Recording,
    /// A start or stop failed; always followed by `Idle`
    Failed,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

/// State of the playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Shared view of the capture session
#[derive(Debug, Clone, Default)]
pub struct RecordingStatus {
    pub state: RecordingState,

    /// Whole seconds since start, advanced by the tick task
    pub elapsed_secs: u64,

    /// File being written
    pub target: Option<Recording>,

    /// Correlates log lines of one capture
    pub session_id: Option<Uuid>,
}

impl RecordingStatus {
    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }
}

/// Shared view of the playback session
#[derive(Debug, Clone, Default)]
pub struct PlaybackStatus {
    pub state: PlaybackState,

    /// Device-reported position in whole seconds
    pub position_secs: u64,

    /// File being played
    pub source: Option<Recording>,

    /// Incremented on every `play`; tags tick tasks and completions
    pub generation: u64,
}

impl PlaybackStatus {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

/// Outcome of a playback toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackToggle {
    Started,
    Stopped,
}

/// Outcome of a recording toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingToggle {
    Started(Recording),
    Stopped(Recording),
}

/// Read-only view consumed by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub is_recording: bool,
    pub recording_elapsed_seconds: u64,
    pub currently_playing: Option<Recording>,
    pub playback_position_seconds: u64,
    pub recordings: Vec<Recording>,
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Short message for the user, the outcome of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,

    /// Error code for failures
    pub code: Option<String>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            code: None,
        }
    }

    pub fn error(error: &ManagerError) -> Self {
        let response = ErrorResponse::from(error);
        Self {
            level: NotificationLevel::Error,
            message: response.message,
            code: Some(response.code),
        }
    }
}

/// Events broadcast by the manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    RecordingStateChanged(RecordingState),
    /// Elapsed seconds of the current capture
    RecordingProgress(u64),
    PlaybackStateChanged(PlaybackState),
    /// Position in seconds of the current playback
    PlaybackProgress(u64),
    /// Listing reloaded; carries the new count
    ListingChanged(usize),
    Notification(Notification),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::session::RecordingError;

    #[test]
    fn test_default_status_is_idle() {
        let recording = RecordingStatus::default();
        assert_eq!(recording.state, RecordingState::Idle);
        assert!(!recording.is_recording());
        assert!(recording.target.is_none());

        let playback = PlaybackStatus::default();
        assert_eq!(playback.state, PlaybackState::Idle);
        assert!(!playback.is_playing());
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = Snapshot {
            is_recording: true,
            recording_elapsed_seconds: 7,
            currently_playing: None,
            playback_position_seconds: 0,
            recordings: Vec::new(),
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["isRecording"], true);
        assert_eq!(json["recordingElapsedSeconds"], 7);
        assert!(json["currentlyPlaying"].is_null());
    }

    #[test]
    fn test_error_notification_carries_code() {
        let note = Notification::error(&ManagerError::from(RecordingError::PermissionDenied));
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(note.message, "Permission not granted!");
        assert_eq!(note.code.as_deref(), Some("PERMISSION_DENIED"));

        let note = Notification::info("Recording saved!");
        assert_eq!(note.level, NotificationLevel::Info);
        assert!(note.code.is_none());
    }
}
