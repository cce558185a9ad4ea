//! Error types for the watch engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot subscribe to {path}: {reason}")]
    Registration { path: PathBuf, reason: String },

    #[error("Invalid watcher configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Event channel closed unexpectedly")]
    ChannelClosed,
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}

impl WatchError {
    /// Registration failure for a specific directory.
    pub(crate) fn registration(path: impl Into<PathBuf>, e: impl std::fmt::Display) -> Self {
        WatchError::Registration {
            path: path.into(),
            reason: e.to_string(),
        }
    }
}
