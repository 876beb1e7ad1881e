//! Recordings directory operations
//!
//! `FileStore` is a thin facade over the filesystem. It never caches the
//! listing: every call to [`FileStore::list`] reads the directory again, and
//! rename/delete only touch the disk.

use super::recording::{generate_file_stem, Recording};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Filesystem errors surfaced by the store
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Failed to create directory {path:?}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    #[error("A recording named '{0}' already exists")]
    Conflict(String),

    #[error("Rename failed: {0}")]
    RenameFailed(String),

    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    #[error("Failed to delete file: {0}")]
    DeleteFailed(String),

    #[error("File is outside the recordings directory: {0:?}")]
    OutsideDirectory(PathBuf),
}

/// Recordings directory with a single managed extension
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    extension: String,
}

impl FileStore {
    /// Create a store over `dir`, managing files ending in `.{extension}`
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension: String = extension.into();
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Create the recordings directory (and parents) if it is missing
    pub fn ensure_directory(&self) -> Result<(), IoError> {
        if self.dir.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(&self.dir).map_err(|e| IoError::CreateFailed {
            path: self.dir.clone(),
            reason: e.to_string(),
        })?;

        tracing::info!("Created recordings directory {:?}", self.dir);
        Ok(())
    }

    /// List recordings in the directory, sorted by file name.
    ///
    /// A missing or unreadable directory yields an empty list.
    pub fn list(&self) -> Vec<Recording> {
        if !self.dir.exists() {
            return Vec::new();
        }

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to read recordings directory {:?}: {}", self.dir, e);
                return Vec::new();
            }
        };

        let mut recordings: Vec<Recording> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.has_managed_extension(path))
            .map(|path| Recording::from_path(path).with_size())
            .collect();

        recordings.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

        tracing::debug!("Listed {} recordings in {:?}", recordings.len(), self.dir);
        recordings
    }

    /// Path for a new recording started at `now`.
    ///
    /// Appends `_<n>` when a recording with the same second already exists.
    pub fn next_recording_path(&self, now: NaiveDateTime) -> PathBuf {
        let stem = generate_file_stem(now);
        let mut candidate = self.path_for(&stem);
        let mut counter = 1;

        while candidate.exists() {
            counter += 1;
            candidate = self.path_for(&format!("{}_{}", stem, counter));
        }

        candidate
    }

    /// The same recording addressed as `<dir>/<file name>`.
    ///
    /// Paths reaching the directory through another route (`sub/..`,
    /// symlinks) resolve to the one spelling the sessions use.
    pub fn resolve(&self, recording: &Recording) -> Result<Recording, IoError> {
        self.ensure_managed(&recording.path)?;

        let file_name = recording
            .path
            .file_name()
            .ok_or_else(|| IoError::OutsideDirectory(recording.path.clone()))?;

        Ok(Recording {
            path: self.dir.join(file_name),
            ..recording.clone()
        })
    }

    /// Rename a recording to `{new_base_name}.{ext}` in the same directory
    pub fn rename(&self, recording: &Recording, new_base_name: &str) -> Result<Recording, IoError> {
        self.ensure_managed(&recording.path)?;

        let base = self.normalize_name(new_base_name)?;
        let target = self.path_for(&base);

        if target.exists() {
            return Err(IoError::Conflict(base));
        }

        fs::rename(&recording.path, &target).map_err(|e| IoError::RenameFailed(e.to_string()))?;

        tracing::info!("Renamed {:?} to {:?}", recording.path, target);
        Ok(Recording::from_path(target).with_size())
    }

    /// Remove a recording from disk
    pub fn delete(&self, recording: &Recording) -> Result<(), IoError> {
        self.ensure_managed(&recording.path)?;

        fs::remove_file(&recording.path).map_err(|e| IoError::DeleteFailed(e.to_string()))?;

        tracing::info!("Deleted {:?}", recording.path);
        Ok(())
    }

    fn path_for(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", stem, self.extension))
    }

    fn has_managed_extension(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.extension.as_str()))
    }

    /// Trim the user's input and drop a trailing managed extension
    fn normalize_name(&self, input: &str) -> Result<String, IoError> {
        let trimmed = input.trim();
        let base = match trimmed.rsplit_once('.') {
            Some((stem, ext)) if ext.eq_ignore_ascii_case(&self.extension) => stem.trim(),
            _ => trimmed,
        };

        let invalid = base.is_empty()
            || base == "."
            || base == ".."
            || base.contains('/')
            || base.contains('\\')
            || base.contains('\0');

        if invalid {
            return Err(IoError::InvalidName(input.to_string()));
        }

        Ok(base.to_string())
    }

    fn ensure_managed(&self, path: &Path) -> Result<(), IoError> {
        let Some(parent) = path.parent() else {
            return Err(IoError::OutsideDirectory(path.to_path_buf()));
        };

        if parent == self.dir {
            return Ok(());
        }

        match (parent.canonicalize(), self.dir.canonicalize()) {
            (Ok(a), Ok(b)) if a == b => Ok(()),
            _ => Err(IoError::OutsideDirectory(path.to_path_buf())),
        }
    }
}
