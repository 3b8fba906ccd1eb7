//! Error types for fileguard

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for tracking operations
pub type Result<T> = std::result::Result<T, GuardError>;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Baseline keys are UTF-8 strings; such a path cannot be stored
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },

    #[error("baseline {} is corrupt: {reason}", path.display())]
    CorruptStore { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl GuardError {
    pub(crate) fn not_found(path: impl Into<PathBuf>) -> Self {
        GuardError::NotFound { path: path.into() }
    }

    pub(crate) fn non_utf8(path: impl Into<PathBuf>) -> Self {
        GuardError::NonUtf8Path { path: path.into() }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        GuardError::CorruptStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GuardError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GuardError::Write {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GuardError::NotFound { .. })
    }

    pub fn is_corrupt_store(&self) -> bool {
        matches!(self, GuardError::CorruptStore { .. })
    }
}
