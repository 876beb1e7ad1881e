//! Capture session
//!
//! Owns the capture device for the lifetime of one recording. Any failure
//! leaves the session `Idle` with the device released, so a broken capture
//! never blocks the next start.

use super::state::{ManagerEvent, RecordingState, RecordingStatus};
use super::ticker::{Ticker, TICK_INTERVAL};
use crate::capture::{AudioRecorder, CaptureHandle, DeviceError, EncodingConfig};
use crate::library::Recording;
use parking_lot::RwLock;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::Instant;
use uuid::Uuid;

/// Capture session errors
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Permission not granted!")]
    PermissionDenied,

    #[error("A recording is already in progress")]
    DeviceBusy,

    #[error("Failed to prepare recording: {0}")]
    PrepareFailed(String),

    #[error("Failed to stop recording: {0}")]
    StopFailed(String),

    #[error("Not recording")]
    NotRecording,
}

pub type RecordingResult<T> = Result<T, RecordingError>;

/// The single capture session
pub struct RecordingSession {
    recorder: Arc<dyn AudioRecorder>,
    encoding: EncodingConfig,
    status: Arc<RwLock<RecordingStatus>>,
    handle: Option<Arc<dyn CaptureHandle>>,
    ticker: Option<Ticker>,
    tick_interval: Duration,
    event_tx: broadcast::Sender<ManagerEvent>,
}

impl RecordingSession {
    pub fn new(
        recorder: Arc<dyn AudioRecorder>,
        encoding: EncodingConfig,
        event_tx: broadcast::Sender<ManagerEvent>,
    ) -> Self {
        Self {
            recorder,
            encoding,
            status: Arc::new(RwLock::new(RecordingStatus::default())),
            handle: None,
            ticker: None,
            tick_interval: TICK_INTERVAL,
            event_tx,
        }
    }

    /// Use a different period for the elapsed counter
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Shared status, readable without holding the session
    pub fn status_handle(&self) -> Arc<RwLock<RecordingStatus>> {
        self.status.clone()
    }

    pub fn state(&self) -> RecordingState {
        self.status.read().state
    }

    /// Elapsed seconds; zero unless recording
    pub fn elapsed_secs(&self) -> u64 {
        let status = self.status.read();
        if status.is_recording() {
            status.elapsed_secs
        } else {
            0
        }
    }

    /// File currently being written
    pub fn target(&self) -> Option<Recording> {
        self.status.read().target.clone()
    }

    /// Check the preconditions of `start` that do not touch the device
    pub fn ensure_can_start(&self) -> RecordingResult<()> {
        if self.state() == RecordingState::Recording {
            return Err(RecordingError::DeviceBusy);
        }
        if !self.recorder.has_permission() {
            return Err(RecordingError::PermissionDenied);
        }
        Ok(())
    }

    /// Start capturing into `output_path`, which must not exist yet
    pub async fn start(&mut self, output_path: &Path) -> RecordingResult<Recording> {
        self.ensure_can_start()?;

        let dir_ready = output_path.parent().is_some_and(|dir| dir.is_dir());
        if !dir_ready {
            return Err(self.fail(RecordingError::PrepareFailed(format!(
                "output directory for {:?} does not exist",
                output_path
            ))));
        }
        if output_path.exists() {
            return Err(self.fail(RecordingError::PrepareFailed(format!(
                "{:?} already exists",
                output_path
            ))));
        }

        let handle = match self.recorder.open(output_path, &self.encoding).await {
            Ok(handle) => handle,
            Err(e) => {
                discard_incomplete(output_path);
                return Err(self.fail(RecordingError::PrepareFailed(e.to_string())));
            }
        };

        if let Err(e) = handle.start().await {
            handle.release();
            discard_incomplete(output_path);
            return Err(self.fail(RecordingError::PrepareFailed(e.to_string())));
        }

        let session_id = Uuid::new_v4();
        let target = Recording::from_path(output_path);
        {
            let mut status = self.status.write();
            *status = RecordingStatus {
                state: RecordingState::Recording,
                elapsed_secs: 0,
                target: Some(target.clone()),
                session_id: Some(session_id),
            };
        }
        self.handle = Some(handle);
        self.ticker = Some(self.spawn_ticker(session_id));
        let _ = self
            .event_tx
            .send(ManagerEvent::RecordingStateChanged(RecordingState::Recording));

        tracing::info!(%session_id, "Recording started: {:?}", output_path);
        Ok(target)
    }

    /// Stop capturing and return the finished recording.
    ///
    /// The device is released and the session is `Idle` afterwards, whether
    /// or not the device stopped cleanly.
    pub async fn stop(&mut self) -> RecordingResult<Recording> {
        let (target, session_id) = {
            let status = self.status.read();
            if !status.is_recording() {
                return Err(RecordingError::NotRecording);
            }
            (status.target.clone(), status.session_id)
        };

        self.ticker.take();

        let stop_result = match self.handle.take() {
            Some(handle) => {
                let result = handle.stop().await;
                handle.release();
                result
            }
            None => Err(DeviceError::Stop("capture handle missing".to_string())),
        };

        match (stop_result, target) {
            (Ok(()), Some(target)) => {
                self.reset();
                tracing::info!(session_id = ?session_id, "Recording saved: {:?}", target.path);
                Ok(target.with_size())
            }
            (Ok(()), None) => Err(self.fail(RecordingError::StopFailed(
                "no target file recorded".to_string(),
            ))),
            (Err(e), target) => {
                if let Some(target) = target {
                    discard_incomplete(&target.path);
                }
                Err(self.fail(RecordingError::StopFailed(e.to_string())))
            }
        }
    }

    fn spawn_ticker(&self, session_id: Uuid) -> Ticker {
        let status = self.status.clone();
        let event_tx = self.event_tx.clone();
        let started = Instant::now();

        Ticker::spawn(self.tick_interval, move || {
            let elapsed = {
                let mut status = status.write();
                if !status.is_recording() || status.session_id != Some(session_id) {
                    return false;
                }
                status.elapsed_secs = started.elapsed().as_secs();
                status.elapsed_secs
            };
            let _ = event_tx.send(ManagerEvent::RecordingProgress(elapsed));
            true
        })
    }

    /// Pass through `Failed` back to `Idle`
    fn fail(&mut self, error: RecordingError) -> RecordingError {
        tracing::error!("Recording failed: {}", error);
        self.ticker.take();
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
        self.status.write().state = RecordingState::Failed;
        let _ = self
            .event_tx
            .send(ManagerEvent::RecordingStateChanged(RecordingState::Failed));
        self.reset();
        error
    }

    fn reset(&mut self) {
        *self.status.write() = RecordingStatus::default();
        let _ = self
            .event_tx
            .send(ManagerEvent::RecordingStateChanged(RecordingState::Idle));
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::warn!("Recording session dropped while capturing; releasing device");
            handle.release();
        }
    }
}

/// Remove a file that a failed capture may have left behind
fn discard_incomplete(path: &Path) {
    if !path.exists() {
        return;
    }
    match fs::remove_file(path) {
        Ok(()) => tracing::warn!("Discarded incomplete recording {:?}", path),
        Err(e) => tracing::error!("Failed to discard incomplete recording {:?}: {}", path, e),
    }
}
