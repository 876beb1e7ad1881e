//! Simulated audio devices
//!
//! File-backed stand-ins for the platform recorder and player. The recorder
//! writes a small placeholder payload to the output path; the player checks
//! that the source exists and reports completion after a configurable media
//! length. Both expose switches to inject permission and device failures.

use super::traits::{
    AudioPlayer, AudioRecorder, CaptureHandle, CompletionCallback, DeviceError, EncodingConfig,
    PlaybackHandle,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const CONTAINER_HEADER: &[u8] = b"\x00\x00\x00\x18ftypmp42";
const AUDIO_PAYLOAD: &[u8] = b"simulated-aac-frames";

/// Simulated microphone recorder
pub struct SimulatedRecorder {
    permission: AtomicBool,
    fail_open: AtomicBool,
    fail_stop: AtomicBool,
    open_count: AtomicUsize,
}

impl SimulatedRecorder {
    pub fn new() -> Self {
        Self {
            permission: AtomicBool::new(true),
            fail_open: AtomicBool::new(false),
            fail_stop: AtomicBool::new(false),
            open_count: AtomicUsize::new(0),
        }
    }

    /// Grant or revoke microphone access
    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::Relaxed);
    }

    /// Make `open` fail after leaving a partial file behind
    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::Relaxed);
    }

    /// Make `stop` fail on captures opened from now on
    pub fn set_fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::Relaxed);
    }

    /// Number of successful `open` calls
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::Relaxed)
    }
}

impl Default for SimulatedRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioRecorder for SimulatedRecorder {
    fn has_permission(&self) -> bool {
        self.permission.load(Ordering::Relaxed)
    }

    async fn open(
        &self,
        output: &Path,
        config: &EncodingConfig,
    ) -> Result<Arc<dyn CaptureHandle>, DeviceError> {
        tracing::debug!("Simulated recorder opening {:?} with {:?}", output, config);

        fs::write(output, CONTAINER_HEADER).map_err(|e| DeviceError::Open(e.to_string()))?;

        if self.fail_open.load(Ordering::Relaxed) {
            return Err(DeviceError::Open("codec initialization failed".to_string()));
        }

        self.open_count.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(SimulatedCapture {
            path: output.to_path_buf(),
            fail_stop: self.fail_stop.load(Ordering::Relaxed),
            started: AtomicBool::new(false),
            released: AtomicBool::new(false),
        }))
    }
}

/// A capture in progress on the simulated recorder
struct SimulatedCapture {
    path: PathBuf,
    fail_stop: bool,
    started: AtomicBool,
    released: AtomicBool,
}

#[async_trait]
impl CaptureHandle for SimulatedCapture {
    async fn start(&self) -> Result<(), DeviceError> {
        if self.released.load(Ordering::Relaxed) {
            return Err(DeviceError::Start("capture already released".to_string()));
        }
        self.started.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        if !self.started.swap(false, Ordering::Relaxed) {
            return Err(DeviceError::Stop("capture was not started".to_string()));
        }
        if self.fail_stop {
            return Err(DeviceError::Stop("encoder flush failed".to_string()));
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| DeviceError::Stop(e.to_string()))?;
        file.write_all(AUDIO_PAYLOAD)
            .map_err(|e| DeviceError::Stop(e.to_string()))?;
        Ok(())
    }

    fn release(&self) {
        self.started.store(false, Ordering::Relaxed);
        self.released.store(true, Ordering::Relaxed);
    }
}

/// Simulated speaker output
pub struct SimulatedPlayer {
    media_length: Mutex<Duration>,
    fail_start: AtomicBool,
    open_count: AtomicUsize,
}

impl SimulatedPlayer {
    /// Player whose media all last `media_length`
    pub fn new(media_length: Duration) -> Self {
        Self {
            media_length: Mutex::new(media_length),
            fail_start: AtomicBool::new(false),
            open_count: AtomicUsize::new(0),
        }
    }

    pub fn set_media_length(&self, length: Duration) {
        *self.media_length.lock() = length;
    }

    /// Make `start` fail on playbacks opened from now on
    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::Relaxed);
    }

    /// Number of successful `open` calls
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::Relaxed)
    }
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl AudioPlayer for SimulatedPlayer {
    async fn open(&self, source: &Path) -> Result<Arc<dyn PlaybackHandle>, DeviceError> {
        if !source.is_file() {
            return Err(DeviceError::Open(format!("no such file: {:?}", source)));
        }

        self.open_count.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(SimulatedPlayback {
            shared: Arc::new(PlaybackShared {
                length: *self.media_length.lock(),
                started_at: Mutex::new(None),
                active: AtomicBool::new(false),
                callback: Mutex::new(None),
            }),
            fail_start: self.fail_start.load(Ordering::Relaxed),
            timer: Mutex::new(None),
        }))
    }
}

struct PlaybackShared {
    length: Duration,
    started_at: Mutex<Option<Instant>>,
    active: AtomicBool,
    callback: Mutex<Option<CompletionCallback>>,
}

/// A playback on the simulated player
struct SimulatedPlayback {
    shared: Arc<PlaybackShared>,
    fail_start: bool,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedPlayback {
    fn cancel_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
    }
}

#[async_trait]
impl PlaybackHandle for SimulatedPlayback {
    async fn start(&self) -> Result<(), DeviceError> {
        if self.fail_start {
            return Err(DeviceError::Start("media could not be decoded".to_string()));
        }

        *self.shared.started_at.lock() = Some(Instant::now());
        self.shared.active.store(true, Ordering::Relaxed);

        let shared = self.shared.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(shared.length).await;
            if shared.active.swap(false, Ordering::Relaxed) {
                let callback = shared.callback.lock().take();
                if let Some(callback) = callback {
                    callback();
                }
            }
        });
        *self.timer.lock() = Some(timer);

        Ok(())
    }

    fn current_position(&self) -> Duration {
        match *self.shared.started_at.lock() {
            Some(started) => started.elapsed().min(self.shared.length),
            None => Duration::ZERO,
        }
    }

    fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Relaxed)
    }

    fn on_completion(&self, callback: CompletionCallback) {
        *self.shared.callback.lock() = Some(callback);
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        self.shared.active.store(false, Ordering::Relaxed);
        self.cancel_timer();
        Ok(())
    }

    fn release(&self) {
        self.shared.active.store(false, Ordering::Relaxed);
        self.cancel_timer();
        self.shared.callback.lock().take();
    }
}
