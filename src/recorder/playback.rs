//! Playback session
//!
//! Owns the playback device. End-of-media arrives from the device as a
//! callback; the callback only posts a [`PlaybackEvent`] and the owner of the
//! session applies it through [`PlaybackSession::handle_event`].

use super::state::{ManagerEvent, PlaybackState, PlaybackStatus, PlaybackToggle};
use super::ticker::{Ticker, TICK_INTERVAL};
use crate::capture::{AudioPlayer, PlaybackHandle};
use crate::library::Recording;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

/// Playback session errors
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Recording cannot be played: {0}")]
    SourceUnavailable(String),

    #[error("Failed to stop playback: {0}")]
    StopFailed(String),
}

/// Messages from the playback device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Media of the given play generation reached its end
    Completed { generation: u64 },
}

/// The single playback session
pub struct PlaybackSession {
    player: Arc<dyn AudioPlayer>,
    status: Arc<RwLock<PlaybackStatus>>,
    handle: Option<Arc<dyn PlaybackHandle>>,
    ticker: Option<Ticker>,
    tick_interval: Duration,
    generation: u64,
    completion_tx: mpsc::UnboundedSender<PlaybackEvent>,
    event_tx: broadcast::Sender<ManagerEvent>,
}

impl PlaybackSession {
    pub fn new(
        player: Arc<dyn AudioPlayer>,
        completion_tx: mpsc::UnboundedSender<PlaybackEvent>,
        event_tx: broadcast::Sender<ManagerEvent>,
    ) -> Self {
        Self {
            player,
            status: Arc::new(RwLock::new(PlaybackStatus::default())),
            handle: None,
            ticker: None,
            tick_interval: TICK_INTERVAL,
            generation: 0,
            completion_tx,
            event_tx,
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Shared status, readable without holding the session
    pub fn status_handle(&self) -> Arc<RwLock<PlaybackStatus>> {
        self.status.clone()
    }

    pub fn state(&self) -> PlaybackState {
        self.status.read().state
    }

    pub fn source(&self) -> Option<Recording> {
        self.status.read().source.clone()
    }

    pub fn position_secs(&self) -> u64 {
        self.status.read().position_secs
    }

    /// Whether `recording` is the file currently playing
    pub fn is_playing(&self, recording: &Recording) -> bool {
        let status = self.status.read();
        status.is_playing()
            && status
                .source
                .as_ref()
                .is_some_and(|source| source.is_at(&recording.path))
    }

    /// Toggle playback of `recording`.
    ///
    /// Stops it if it is the file already playing; otherwise stops whatever
    /// is playing and starts `recording`.
    pub async fn play(&mut self, recording: &Recording) -> Result<PlaybackToggle, PlaybackError> {
        if self.is_playing(recording) {
            self.stop().await?;
            return Ok(PlaybackToggle::Stopped);
        }

        if let Err(e) = self.stop().await {
            tracing::warn!("Previous playback did not stop cleanly: {}", e);
        }

        self.generation += 1;
        let generation = self.generation;

        let handle = self
            .player
            .open(&recording.path)
            .await
            .map_err(|e| PlaybackError::SourceUnavailable(e.to_string()))?;

        let completion_tx = self.completion_tx.clone();
        handle.on_completion(Box::new(move || {
            let _ = completion_tx.send(PlaybackEvent::Completed { generation });
        }));

        if let Err(e) = handle.start().await {
            handle.release();
            return Err(PlaybackError::SourceUnavailable(e.to_string()));
        }

        {
            let mut status = self.status.write();
            *status = PlaybackStatus {
                state: PlaybackState::Playing,
                position_secs: 0,
                source: Some(recording.clone()),
                generation,
            };
        }
        self.ticker = Some(self.spawn_ticker(handle.clone(), generation));
        self.handle = Some(handle);
        let _ = self
            .event_tx
            .send(ManagerEvent::PlaybackStateChanged(PlaybackState::Playing));

        tracing::info!(generation, "Playing {:?}", recording.path);
        Ok(PlaybackToggle::Started)
    }

    /// Stop playback. A no-op when nothing is playing.
    pub async fn stop(&mut self) -> Result<(), PlaybackError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        self.ticker.take();
        let result = handle.stop().await;
        handle.release();
        self.reset();

        tracing::info!("Playback stopped");
        result.map_err(|e| PlaybackError::StopFailed(e.to_string()))
    }

    /// Apply a device event. Returns `true` if the session changed.
    pub fn handle_event(&mut self, event: PlaybackEvent) -> bool {
        match event {
            PlaybackEvent::Completed { generation } => {
                if generation != self.generation || self.handle.is_none() {
                    tracing::debug!("Ignoring stale completion for generation {}", generation);
                    return false;
                }

                self.ticker.take();
                if let Some(handle) = self.handle.take() {
                    handle.release();
                }
                self.reset();

                tracing::info!(generation, "Playback completed");
                true
            }
        }
    }

    fn spawn_ticker(&self, handle: Arc<dyn PlaybackHandle>, generation: u64) -> Ticker {
        let status = self.status.clone();
        let event_tx = self.event_tx.clone();

        Ticker::spawn(self.tick_interval, move || {
            let position = {
                let mut status = status.write();
                if !status.is_playing() || status.generation != generation {
                    return false;
                }
                status.position_secs = handle.current_position().as_secs();
                status.position_secs
            };
            let _ = event_tx.send(ManagerEvent::PlaybackProgress(position));
            handle.is_active()
        })
    }

    fn reset(&mut self) {
        *self.status.write() = PlaybackStatus {
            generation: self.generation,
            ..PlaybackStatus::default()
        };
        let _ = self
            .event_tx
            .send(ManagerEvent::PlaybackStateChanged(PlaybackState::Idle));
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SimulatedPlayer;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    fn session_with(
        player: Arc<SimulatedPlayer>,
    ) -> (PlaybackSession, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(100);
        (
            PlaybackSession::new(player, completion_tx, event_tx),
            completion_rx,
        )
    }

    fn memo(dir: &Path, name: &str) -> Recording {
        let path = dir.join(name);
        fs::write(&path, b"audio").unwrap();
        Recording::from_path(path)
    }

    #[tokio::test]
    async fn test_play_same_file_toggles_off() {
        let dir = tempdir().unwrap();
        let a = memo(dir.path(), "a.mp4");
        let (mut session, _rx) = session_with(Arc::new(SimulatedPlayer::default()));

        assert_eq!(session.play(&a).await.unwrap(), PlaybackToggle::Started);
        assert_eq!(session.state(), PlaybackState::Playing);
        assert_eq!(session.source(), Some(a.clone()));

        assert_eq!(session.play(&a).await.unwrap(), PlaybackToggle::Stopped);
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.source().is_none());
    }

    #[tokio::test]
    async fn test_play_other_file_switches() {
        let dir = tempdir().unwrap();
        let a = memo(dir.path(), "a.mp4");
        let b = memo(dir.path(), "b.mp4");
        let player = Arc::new(SimulatedPlayer::default());
        let (mut session, _rx) = session_with(player.clone());

        session.play(&a).await.unwrap();
        assert_eq!(session.play(&b).await.unwrap(), PlaybackToggle::Started);

        assert!(session.is_playing(&b));
        assert!(!session.is_playing(&a));
        assert_eq!(player.open_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_source_is_unavailable() {
        let dir = tempdir().unwrap();
        let ghost = Recording::from_path(dir.path().join("ghost.mp4"));
        let (mut session, _rx) = session_with(Arc::new(SimulatedPlayer::default()));

        let result = session.play(&ghost).await;
        assert!(matches!(result, Err(PlaybackError::SourceUnavailable(_))));
        assert_eq!(session.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_start_failure_is_unavailable() {
        let dir = tempdir().unwrap();
        let a = memo(dir.path(), "a.mp4");
        let player = Arc::new(SimulatedPlayer::default());
        player.set_fail_start(true);
        let (mut session, _rx) = session_with(player);

        let result = session.play(&a).await;
        assert!(matches!(result, Err(PlaybackError::SourceUnavailable(_))));
        assert_eq!(session.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let (mut session, _rx) = session_with(Arc::new(SimulatedPlayer::default()));
        session.stop().await.unwrap();
        assert_eq!(session.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_tracks_device() {
        let dir = tempdir().unwrap();
        let a = memo(dir.path(), "a.mp4");
        let (mut session, _rx) = session_with(Arc::new(SimulatedPlayer::new(Duration::from_secs(60))));

        session.play(&a).await.unwrap();
        tokio::time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(session.position_secs(), 4);

        session.stop().await.unwrap();
        assert_eq!(session.position_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_event_idles_session() {
        let dir = tempdir().unwrap();
        let a = memo(dir.path(), "a.mp4");
        let (mut session, mut rx) = session_with(Arc::new(SimulatedPlayer::new(Duration::from_secs(2))));

        session.play(&a).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event, PlaybackEvent::Completed { generation: 1 });

        assert!(session.handle_event(event));
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.source().is_none());
        assert_eq!(session.position_secs(), 0);
    }

    #[tokio::test]
    async fn test_stale_completion_is_ignored() {
        let dir = tempdir().unwrap();
        let a = memo(dir.path(), "a.mp4");
        let b = memo(dir.path(), "b.mp4");
        let (mut session, _rx) = session_with(Arc::new(SimulatedPlayer::default()));

        session.play(&a).await.unwrap();
        session.play(&b).await.unwrap();

        assert!(!session.handle_event(PlaybackEvent::Completed { generation: 1 }));
        assert!(session.is_playing(&b));
    }
}
