//! Audio device capabilities
//!
//! The sessions only see the traits defined here; platform backends plug in
//! behind them.

pub mod simulated;
pub mod traits;

pub use simulated::{SimulatedPlayer, SimulatedRecorder};
pub use traits::{
    AudioCodec, AudioPlayer, AudioRecorder, AudioSource, CaptureHandle, CompletionCallback,
    ContainerFormat, DeviceError, EncodingConfig, PlaybackHandle,
};
