//! Recording system module
//!
//! This module implements the session layer:
//! - RecordingSession owning the capture device
//! - PlaybackSession owning the playback device
//! - RecordingManager orchestrating both over the recordings directory

pub mod manager;
pub mod playback;
pub mod session;
pub mod state;
pub mod ticker;

pub use manager::RecordingManager;
pub use playback::{PlaybackError, PlaybackEvent, PlaybackSession};
pub use session::{RecordingError, RecordingResult, RecordingSession};
pub use state::{
    ManagerEvent, Notification, NotificationLevel, PlaybackState, PlaybackToggle, RecordingState,
    RecordingToggle, Snapshot,
};
pub use ticker::{Ticker, TICK_INTERVAL};
