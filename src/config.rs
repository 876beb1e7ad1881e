//! Manager configuration
//!
//! Stored as a camelCase JSON file. Every field is optional; missing fields
//! and a missing file fall back to the defaults.

use crate::capture::EncodingConfig;
use crate::recorder::ticker::TICK_INTERVAL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const RECORDINGS_DIR_NAME: &str = "Recordings";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for a `RecordingManager`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagerConfig {
    /// Directory holding the recordings
    pub recordings_dir: PathBuf,

    /// Managed file extension, without the dot
    pub extension: String,

    /// Period of the elapsed/position counters; 0 means the default
    pub tick_interval_ms: u64,

    /// Encoding handed to the capture device
    pub encoding: EncodingConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        let encoding = EncodingConfig::default();
        Self {
            recordings_dir: default_recordings_dir(),
            extension: encoding.container.extension().to_string(),
            tick_interval_ms: TICK_INTERVAL.as_millis() as u64,
            encoding,
        }
    }
}

impl ManagerConfig {
    /// Defaults with a different recordings directory
    pub fn with_recordings_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            recordings_dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn tick_interval(&self) -> Duration {
        if self.tick_interval_ms == 0 {
            TICK_INTERVAL
        } else {
            Duration::from_millis(self.tick_interval_ms)
        }
    }

    /// Read the config file, or the defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: ManagerConfig = serde_json::from_str(&content)?;

        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Write the config file, creating its directory if needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// `<audio dir>/Recordings`, falling back to `~/Music` and then the cwd
pub fn default_recordings_dir() -> PathBuf {
    dirs::audio_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Music")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(RECORDINGS_DIR_NAME)
}
