//! Error types for the packaging pipeline.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.
//! Per-item transform failures are deliberately *not* represented here: they are
//! recorded on the item's `TransformResult` and never unwind the run.

use std::io;
use thiserror::Error;
use serde::Serialize;

/// Batch-aggregate admission failures.
///
/// These reject the entire run before any processing resource is committed.
/// Per-file rejections are reported as warnings instead (see `admission`).
#[derive(Error, Debug, Serialize, PartialEq)]
pub enum AdmissionError {
    /// More admitted files than the configured ceiling
    #[error("Too many files: {count} admitted, limit is {limit}")]
    TooManyFiles { count: usize, limit: usize },
    /// Total admitted bytes exceed the configured ceiling
    #[error("Batch too large: {bytes} bytes admitted, limit is {limit}")]
    BatchTooLarge { bytes: u64, limit: u64 },
}

/// Structural settings validation failures.
#[derive(Error, Debug, Serialize, PartialEq)]
pub enum SettingsError {
    /// Project name is the only mandatory field
    #[error("Project name is required")]
    MissingProjectName,
    /// A quality value fell outside its tier's closed range
    #[error("Invalid {tier} quality {value}: must be between {min} and {max}")]
    QualityOutOfRange { tier: &'static str, value: u8, min: u8, max: u8 },
    /// Max dimension is not one of the enumerated allowed values
    #[error("Invalid max dimension {0}: not an allowed value")]
    InvalidMaxDimension(u32),
    /// Every output toggle is off and originals/RAW are left in place
    #[error("No output selected: enable at least one output or original inclusion")]
    NoOutputSelected,
}

/// Session persistence failures.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Underlying store IO failed
    #[error("Session store IO error: {0}")]
    Io(String),
    /// Session record could not be (de)serialized
    #[error("Session serialization error: {0}")]
    Serde(String),
    /// Re-supplied file set is missing fingerprints the session recorded
    #[error("Resume rejected: {missing} recorded file(s) absent from the supplied set")]
    ResumeMismatch { missing: usize },
    /// Requested session does not exist, is finished, or fell outside the
    /// resume window
    #[error("Session {0} not found or no longer resumable")]
    NotResumable(uuid::Uuid),
    /// An older checkpoint attempted to revert recorded progress
    #[error("Stale checkpoint for session {0}: progress would be reverted")]
    StaleCheckpoint(uuid::Uuid),
}

/// Main error type for the packaging pipeline.
///
/// Only fatal conditions reach the caller through this type; per-item
/// failures stay inside the run summary.
#[derive(Error, Debug)]
pub enum PackagerError {
    /// Aggregate admission failure (rejects the whole run)
    #[error("Admission error: {0}")]
    Admission(#[from] AdmissionError),

    /// Settings validation failure
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Archive assembly or write failure
    #[error("Archive error: {0}")]
    Archive(String),

    /// Session store failure
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// File IO error
    #[error("IO error: {0}")]
    Io(String),
}

/// Convenience result type for pipeline operations.
pub type PackagerResult<T> = Result<T, PackagerError>;

impl PackagerError {
    pub fn archive<T: Into<String>>(msg: T) -> Self {
        Self::Archive(msg.into())
    }
}

impl From<io::Error> for PackagerError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<io::Error> for SessionError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
