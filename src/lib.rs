//! Voice Memos - record, list, play, rename and delete audio notes.
//!
//! This is the core library: the recording/playback session state machines
//! and the recordings directory they operate on. Audio devices and the user
//! interface plug in from outside through `capture` traits and the
//! `RecordingManager` snapshot/event API.

pub mod capture;
pub mod config;
pub mod library;
pub mod recorder;
pub mod utils;

pub use config::ManagerConfig;
pub use library::{format_duration, FileStore, IoError, Recording};
pub use recorder::{
    ManagerEvent, Notification, PlaybackError, PlaybackToggle, RecordingError, RecordingManager,
    RecordingToggle, Snapshot,
};
pub use utils::{ErrorResponse, ManagerError, ManagerResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
///
/// Honors `RUST_LOG`; defaults to debug output for this crate. Does nothing
/// if a global subscriber is already installed.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voice_memos=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    tracing::info!("Voice Memos core v{}", env!("CARGO_PKG_VERSION"));
}
