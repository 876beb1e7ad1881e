//! Capture and playback device traits
//!
//! Platform-agnostic capabilities the sessions drive. A device hands out a
//! handle per capture or playback; the session owns that handle until it
//! releases it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a capture or playback device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Device could not be opened: {0}")]
    Open(String),

    #[error("Device failed to start: {0}")]
    Start(String),

    #[error("Device failed to stop: {0}")]
    Stop(String),
}

/// Audio input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSource {
    Microphone,
}

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Mpeg4,
}

impl ContainerFormat {
    /// File extension for this container
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Mpeg4 => "mp4",
        }
    }
}

/// Audio codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Aac,
}

/// Fixed encoding settings handed to the capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingConfig {
    pub source: AudioSource,
    pub container: ContainerFormat,
    pub codec: AudioCodec,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            source: AudioSource::Microphone,
            container: ContainerFormat::Mpeg4,
            codec: AudioCodec::Aac,
        }
    }
}

/// Invoked once by the playback device when the media reaches its end
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Audio capture capability
#[async_trait]
pub trait AudioRecorder: Send + Sync {
    /// Whether the user granted microphone access
    fn has_permission(&self) -> bool;

    /// Prepare a capture writing to `output` with the given encoding
    async fn open(
        &self,
        output: &Path,
        config: &EncodingConfig,
    ) -> Result<Arc<dyn CaptureHandle>, DeviceError>;
}

/// An opened capture
#[async_trait]
pub trait CaptureHandle: Send + Sync {
    /// Begin writing audio
    async fn start(&self) -> Result<(), DeviceError>;

    /// Finalize the output file
    async fn stop(&self) -> Result<(), DeviceError>;

    /// Free the device. Safe to call after a failed start or stop.
    fn release(&self);
}

/// Audio playback capability
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Prepare playback of `source`
    async fn open(&self, source: &Path) -> Result<Arc<dyn PlaybackHandle>, DeviceError>;
}

/// An opened playback
#[async_trait]
pub trait PlaybackHandle: Send + Sync {
    /// Begin playing
    async fn start(&self) -> Result<(), DeviceError>;

    /// Position reported by the device
    fn current_position(&self) -> Duration;

    /// Whether the device is still playing
    fn is_active(&self) -> bool;

    /// Register the end-of-media callback. Must be called before `start`.
    fn on_completion(&self, callback: CompletionCallback);

    /// Halt playback
    async fn stop(&self) -> Result<(), DeviceError>;

    /// Free the device
    fn release(&self);
}
