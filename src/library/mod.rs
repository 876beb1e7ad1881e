//! Recordings library
//!
//! The on-disk side of the app:
//! - recording: the `Recording` entity and file naming rules
//! - store: directory listing, rename and delete

pub mod recording;
pub mod store;

pub use recording::{format_duration, Recording};
pub use store::{FileStore, IoError};
