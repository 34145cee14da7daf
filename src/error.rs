//! Error types for s3-backup
//!
//! This module defines the error hierarchy for a backup run:
//! - Source file read errors (open/read failures on the local side)
//! - Object store errors (remote put failures)
//! - Configuration errors (detected before any upload starts)
//!
//! Every in-run error is fatal: the first one observed ends the run.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for an upload run
#[derive(Error, Debug)]
pub enum UploadError {
    /// A source file could not be opened or read
    #[error("Failed to read source file '{path}': {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The object store rejected a put
    #[error("Upload failed: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An upload task panicked instead of reporting an outcome
    #[error("Upload worker for '{path}' panicked: {message}")]
    WorkerPanicked { path: PathBuf, message: String },

    /// The run was cancelled before it finished (Ctrl-C)
    #[error("Upload run cancelled")]
    Cancelled,

    /// An internal channel closed before the run reached a terminal state
    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

impl UploadError {
    /// The local file or remote key this error is about, if any
    pub fn subject(&self) -> Option<String> {
        match self {
            UploadError::SourceRead { path, .. } | UploadError::WorkerPanicked { path, .. } => {
                Some(path.display().to_string())
            }
            UploadError::Store(e) => Some(e.key.clone()),
            _ => None,
        }
    }
}

/// Failure reported by an [`ObjectStore`](crate::store::ObjectStore) put
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("put '{key}' failed: {reason}")]
pub struct StoreError {
    /// Destination key of the failed put
    pub key: String,

    /// Human readable reason from the backend
    pub reason: String,
}

impl StoreError {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid concurrency limit
    #[error("Invalid concurrency {count}: must be between 1 and {max}")]
    InvalidConcurrency { count: usize, max: usize },

    /// Source root missing or not a directory
    #[error("Invalid source directory '{path}': {reason}")]
    InvalidSource { path: PathBuf, reason: String },

    /// Destination prefix unusable as a key prefix
    #[error("Invalid destination '{dest}': {reason}")]
    InvalidDestination { dest: String, reason: String },

    /// Empty bucket name
    #[error("Bucket name must not be empty")]
    MissingBucket,

    /// Credentials not supplied
    #[error("Authentication failed: {0}")]
    MissingCredentials(&'static str),
}

/// Result type alias for UploadError
pub type Result<T> = std::result::Result<T, UploadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_conversion() {
        let store_err = StoreError::new("new/index.html", "AccessDenied");
        let err: UploadError = store_err.into();
        assert!(matches!(err, UploadError::Store(_)));
        assert_eq!(err.subject().as_deref(), Some("new/index.html"));
        assert_eq!(
            err.to_string(),
            "Upload failed: put 'new/index.html' failed: AccessDenied"
        );
    }

    #[test]
    fn test_source_read_names_path() {
        let err = UploadError::SourceRead {
            path: PathBuf::from("/data/missing.bin"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.subject().as_deref(), Some("/data/missing.bin"));
        assert!(err.to_string().contains("/data/missing.bin"));
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::InvalidConcurrency { count: 0, max: 512 };
        assert_eq!(
            err.to_string(),
            "Invalid concurrency 0: must be between 1 and 512"
        );
        assert!(UploadError::from(err).subject().is_none());
    }
}
