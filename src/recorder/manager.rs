//! Recording manager
//!
//! Owns the one capture session, the one playback session and the recordings
//! listing, and is the only entry point the presentation layer talks to.
//!
//! Every command is single-flight per resource: it `try_lock`s what it
//! mutates and fails with [`ManagerError::Busy`] instead of queueing behind a
//! call already in progress. Outcomes are published as notifications before
//! they are returned.

use super::playback::{PlaybackError, PlaybackEvent, PlaybackSession};
use super::session::RecordingSession;
use super::state::{
    ManagerEvent, Notification, PlaybackStatus, PlaybackToggle, RecordingStatus,
    RecordingToggle, Snapshot,
};
use crate::capture::{AudioPlayer, AudioRecorder};
use crate::config::ManagerConfig;
use crate::library::{FileStore, Recording};
use crate::utils::error::{ManagerError, ManagerResult};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc, Mutex};

/// Orchestrates sessions and the recordings directory
pub struct RecordingManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    store: FileStore,
    recording: Mutex<RecordingSession>,
    playback: Mutex<PlaybackSession>,
    recording_status: Arc<RwLock<RecordingStatus>>,
    playback_status: Arc<RwLock<PlaybackStatus>>,
    listing: RwLock<Vec<Recording>>,
    file_ops: Mutex<()>,
    event_tx: broadcast::Sender<ManagerEvent>,
}

impl RecordingManager {
    /// Create the manager and load the initial listing.
    ///
    /// Fails with [`ManagerError::RuntimeUnavailable`] outside a tokio
    /// runtime, which is needed for the task applying playback completions.
    pub fn new(
        config: ManagerConfig,
        recorder: Arc<dyn AudioRecorder>,
        player: Arc<dyn AudioPlayer>,
    ) -> ManagerResult<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ManagerError::RuntimeUnavailable(e.to_string()))?;

        let (event_tx, _) = broadcast::channel(100);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let store = FileStore::new(&config.recordings_dir, config.extension.clone());
        let recording = RecordingSession::new(recorder, config.encoding, event_tx.clone())
            .with_tick_interval(config.tick_interval());
        let playback = PlaybackSession::new(player, completion_tx, event_tx.clone())
            .with_tick_interval(config.tick_interval());
        let listing = store.list();

        tracing::info!(
            "Recording manager ready: {:?} ({} recordings)",
            store.dir(),
            listing.len()
        );

        let inner = Arc::new(ManagerInner {
            recording_status: recording.status_handle(),
            playback_status: playback.status_handle(),
            recording: Mutex::new(recording),
            playback: Mutex::new(playback),
            listing: RwLock::new(listing),
            file_ops: Mutex::new(()),
            store,
            event_tx,
        });

        runtime.spawn(run_playback_events(Arc::downgrade(&inner), completion_rx));

        Ok(Self { inner })
    }

    /// Subscribe to state changes, progress ticks and notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.inner.event_tx.subscribe()
    }

    /// The recordings directory
    pub fn store(&self) -> &FileStore {
        &self.inner.store
    }

    /// Current view for the presentation layer
    pub fn snapshot(&self) -> Snapshot {
        let recording = self.inner.recording_status.read().clone();
        let playback = self.inner.playback_status.read().clone();
        let is_playing = playback.is_playing();

        Snapshot {
            is_recording: recording.is_recording(),
            recording_elapsed_seconds: if recording.is_recording() {
                recording.elapsed_secs
            } else {
                0
            },
            currently_playing: if is_playing { playback.source } else { None },
            playback_position_seconds: if is_playing { playback.position_secs } else { 0 },
            recordings: self.inner.listing.read().clone(),
        }
    }

    /// Listing as of the last reload
    pub fn recordings(&self) -> Vec<Recording> {
        self.inner.listing.read().clone()
    }

    /// Reload the listing from disk
    pub fn refresh(&self) -> Vec<Recording> {
        self.inner.reload_listing()
    }

    /// Start a new capture into a timestamped file.
    ///
    /// Any playback is stopped first.
    pub async fn start_recording(&self) -> ManagerResult<Recording> {
        let result = self.inner.start_recording().await;
        self.inner.publish(result, |_| "Recording started!".to_string())
    }

    /// Finish the capture and reload the listing
    pub async fn stop_recording(&self) -> ManagerResult<Recording> {
        let result = self.inner.stop_recording().await;
        self.inner.publish(result, |_| "Recording saved!".to_string())
    }

    /// Start when idle, stop when recording
    pub async fn toggle_recording(&self) -> ManagerResult<RecordingToggle> {
        let recording = self.inner.recording_status.read().is_recording();
        if recording {
            self.stop_recording().await.map(RecordingToggle::Stopped)
        } else {
            self.start_recording().await.map(RecordingToggle::Started)
        }
    }

    /// Play `recording`, or stop it if it is already playing
    pub async fn toggle_playback(&self, recording: &Recording) -> ManagerResult<PlaybackToggle> {
        let result = self.inner.toggle_playback(recording).await;
        self.inner.publish(result, |toggle| match toggle {
            PlaybackToggle::Started => format!("Playing: {}", recording.file_name()),
            PlaybackToggle::Stopped => "Playback stopped.".to_string(),
        })
    }

    /// Rename `recording` to `new_name` and reload the listing
    pub async fn rename(&self, recording: &Recording, new_name: &str) -> ManagerResult<Recording> {
        let result = self.inner.rename(recording, new_name).await;
        self.inner
            .publish(result, |renamed| format!("File renamed to {}", renamed.name))
    }

    /// Delete `recording` and reload the listing
    pub async fn delete(&self, recording: &Recording) -> ManagerResult<()> {
        let result = self.inner.delete(recording).await;
        self.inner
            .publish(result, |_| format!("File deleted: {}", recording.file_name()))
    }
}

impl ManagerInner {
    async fn start_recording(&self) -> ManagerResult<Recording> {
        let mut recording = self.recording.try_lock().map_err(|_| ManagerError::Busy)?;
        recording.ensure_can_start()?;
        self.store.ensure_directory()?;

        {
            let mut playback = self.playback.try_lock().map_err(|_| ManagerError::Busy)?;
            if let Err(e) = playback.stop().await {
                tracing::warn!("Playback did not stop cleanly before recording: {}", e);
            }
        }

        let path = self
            .store
            .next_recording_path(chrono::Local::now().naive_local());
        Ok(recording.start(&path).await?)
    }

    async fn stop_recording(&self) -> ManagerResult<Recording> {
        let mut recording = self.recording.try_lock().map_err(|_| ManagerError::Busy)?;
        let result = recording.stop().await;
        drop(recording);

        // A failed stop discards the file, so reload either way
        self.reload_listing();
        Ok(result?)
    }

    async fn toggle_playback(&self, recording: &Recording) -> ManagerResult<PlaybackToggle> {
        let mut playback = self.playback.try_lock().map_err(|_| ManagerError::Busy)?;
        let recording = self.store.resolve(recording)?;

        if self.is_being_recorded(&recording.path) {
            return Err(PlaybackError::SourceUnavailable(
                "recording is still being written".to_string(),
            )
            .into());
        }

        Ok(playback.play(&recording).await?)
    }

    async fn rename(&self, recording: &Recording, new_name: &str) -> ManagerResult<Recording> {
        let _guard = self.file_ops.try_lock().map_err(|_| ManagerError::Busy)?;
        let recording = self.store.resolve(recording)?;
        self.release_file(&recording.path).await?;

        let result = self.store.rename(&recording, new_name);
        self.reload_listing();
        Ok(result?)
    }

    async fn delete(&self, recording: &Recording) -> ManagerResult<()> {
        let _guard = self.file_ops.try_lock().map_err(|_| ManagerError::Busy)?;
        let recording = self.store.resolve(recording)?;
        self.release_file(&recording.path).await?;

        let result = self.store.delete(&recording);
        self.reload_listing();
        Ok(result?)
    }

    /// Make sure no session holds `path` before it is moved or removed.
    ///
    /// `path` must come from [`FileStore::resolve`].
    async fn release_file(&self, path: &Path) -> ManagerResult<()> {
        if self.is_being_recorded(path) {
            return Err(ManagerError::Busy);
        }

        let playing_it = {
            let status = self.playback_status.read();
            status.is_playing() && status.source.as_ref().is_some_and(|s| s.is_at(path))
        };
        if playing_it {
            let mut playback = self.playback.try_lock().map_err(|_| ManagerError::Busy)?;
            if let Err(e) = playback.stop().await {
                tracing::warn!("Playback did not stop cleanly: {}", e);
            }
        }

        Ok(())
    }

    fn is_being_recorded(&self, path: &Path) -> bool {
        let status = self.recording_status.read();
        status.is_recording() && status.target.as_ref().is_some_and(|t| t.is_at(path))
    }

    fn reload_listing(&self) -> Vec<Recording> {
        let recordings = self.store.list();
        *self.listing.write() = recordings.clone();
        let _ = self
            .event_tx
            .send(ManagerEvent::ListingChanged(recordings.len()));
        recordings
    }

    fn notify(&self, notification: Notification) {
        let _ = self.event_tx.send(ManagerEvent::Notification(notification));
    }

    /// Turn a command outcome into a notification, then hand it back
    fn publish<T>(
        &self,
        result: ManagerResult<T>,
        describe: impl FnOnce(&T) -> String,
    ) -> ManagerResult<T> {
        match &result {
            Ok(value) => self.notify(Notification::info(describe(value))),
            Err(e) => {
                tracing::warn!("Command failed: {}", e);
                self.notify(Notification::error(e));
            }
        }
        result
    }
}

/// Apply playback device events until the manager is dropped
async fn run_playback_events(
    inner: Weak<ManagerInner>,
    mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };

        let changed = inner.playback.lock().await.handle_event(event);
        if changed {
            inner.notify(Notification::info("Playback completed."));
        }
    }

    tracing::debug!("Playback event loop finished");
}
