//! Recording entity
//!
//! A recording is a persisted audio file in the recordings directory. It is
//! identified by its path; everything else is derived from the file name or
//! the filesystem.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of auto-generated recording names
pub const RECORDING_PREFIX: &str = "recording_";

/// Timestamp layout embedded in auto-generated names (`YYYYMMDD_HHMMSS`)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const TIMESTAMP_LEN: usize = 15;

/// A single recording on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Full path to the file
    pub path: PathBuf,

    /// Display name (file name without the extension)
    pub name: String,

    /// Creation time encoded in the file name, if any
    pub created_at: Option<NaiveDateTime>,

    /// File size in bytes, if known
    pub size_bytes: Option<u64>,
}

impl Recording {
    /// Build a recording from a path without touching the filesystem
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let created_at = parse_created_at(&name);

        Self {
            path,
            name,
            created_at,
            size_bytes: None,
        }
    }

    /// Fill in the byte size from file metadata
    pub fn with_size(mut self) -> Self {
        self.size_bytes = fs::metadata(&self.path).ok().map(|m| m.len());
        self
    }

    /// File name including the extension
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whether this recording refers to the given file
    pub fn is_at(&self, path: &Path) -> bool {
        self.path == path
    }
}

/// Generate the file stem for a recording started at `now`
pub fn generate_file_stem(now: NaiveDateTime) -> String {
    format!("{}{}", RECORDING_PREFIX, now.format(TIMESTAMP_FORMAT))
}

/// Parse the creation time out of an auto-generated file stem.
///
/// Accepts `recording_YYYYMMDD_HHMMSS` optionally followed by a `_<n>`
/// collision suffix. User-chosen names yield `None`.
pub fn parse_created_at(stem: &str) -> Option<NaiveDateTime> {
    let rest = stem.strip_prefix(RECORDING_PREFIX)?;
    let stamp = rest.get(..TIMESTAMP_LEN)?;
    let tail = &rest[TIMESTAMP_LEN..];

    if !tail.is_empty() {
        let counter = tail.strip_prefix('_')?;
        if counter.is_empty() || !counter.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }

    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// Format whole seconds as `MM:SS`
pub fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 30, 52)
            .unwrap()
    }

    #[test]
    fn test_generate_file_stem() {
        assert_eq!(generate_file_stem(sample_time()), "recording_20240309_143052");
    }

    #[test]
    fn test_from_path_derives_name_and_timestamp() {
        let rec = Recording::from_path("/tmp/memos/recording_20240309_143052.mp4");
        assert_eq!(rec.name, "recording_20240309_143052");
        assert_eq!(rec.file_name(), "recording_20240309_143052.mp4");
        assert_eq!(rec.created_at, Some(sample_time()));
        assert!(rec.size_bytes.is_none());
    }

    #[test]
    fn test_user_named_recording_has_no_timestamp() {
        let rec = Recording::from_path("/tmp/memos/groceries.mp4");
        assert_eq!(rec.name, "groceries");
        assert!(rec.created_at.is_none());
    }

    #[test]
    fn test_parse_created_at_with_collision_suffix() {
        assert_eq!(
            parse_created_at("recording_20240309_143052_2"),
            Some(sample_time())
        );
        assert!(parse_created_at("recording_20240309_143052_").is_none());
        assert!(parse_created_at("recording_20240309_143052x").is_none());
        assert!(parse_created_at("recording_2024").is_none());
        assert!(parse_created_at("recording_20241399_143052").is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(5), "00:05");
        assert_eq!(format_duration(65), "01:05");
        assert_eq!(format_duration(3600), "60:00");
    }
}
